// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Evaluator job procedures

use crate::client::{encode, RpcTransport};
use crate::error::Result;
use judgekit_evals::{CreateEvalJob, UpdateEvalJob};
use serde_json::{json, Value};
use tracing::info;

pub const CREATE_JOB: &str = "evals.createJob";
pub const UPDATE_JOB: &str = "evals.updateEvalJob";
pub const DELETE_JOB: &str = "evals.deleteEvalJob";

/// Create an evaluator job, returning the stored configuration
pub async fn create_job<T: RpcTransport + ?Sized>(transport: &T, job: &CreateEvalJob) -> Result<Value> {
    let input = encode(CREATE_JOB, job)?;
    let created = transport.mutate(CREATE_JOB, input).await?;
    info!(
        "Created evaluator job for template {} in project {}",
        job.eval_template_id, job.project_id
    );
    Ok(created)
}

pub async fn update_job<T: RpcTransport + ?Sized>(transport: &T, job: &UpdateEvalJob) -> Result<Value> {
    let input = encode(UPDATE_JOB, job)?;
    let updated = transport.mutate(UPDATE_JOB, input).await?;
    info!("Updated evaluator job {}", job.eval_config_id);
    Ok(updated)
}

pub async fn delete_job<T: RpcTransport + ?Sized>(
    transport: &T,
    project_id: &str,
    eval_config_id: &str,
) -> Result<()> {
    transport
        .mutate(
            DELETE_JOB,
            json!({ "projectId": project_id, "evalConfigId": eval_config_id }),
        )
        .await?;
    info!("Deleted evaluator job {}", eval_config_id);
    Ok(())
}
