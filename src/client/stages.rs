//! Stage endpoints: stage status, checklist, and the project update feed.

use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, ApiError, segment};
use crate::models::{ChecklistItem, DesignStatus, ProjectUpdate, Stage};

#[derive(Serialize)]
struct StageStatusRequest {
    status: DesignStatus,
}

#[derive(Serialize)]
struct ChecklistToggleRequest {
    completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistReorderRequest<'a> {
    item_ids: &'a [String],
}

#[derive(Serialize)]
struct PostUpdateRequest<'a> {
    content: &'a str,
}

impl ApiClient {
    pub async fn get_stage(&self, stage_id: &str) -> Result<Stage, ApiError> {
        self.get_json(&format!("/api/stages/{}", segment(stage_id)))
            .await
    }

    /// Set a stage's status. Any status may follow any other.
    pub async fn update_stage_status(
        &self,
        stage_id: &str,
        status: DesignStatus,
    ) -> Result<Stage, ApiError> {
        let path = format!("/api/stages/{}", segment(stage_id));
        self.send_json(Method::PATCH, &path, &StageStatusRequest { status })
            .await
    }

    pub async fn list_checklist(&self, stage_id: &str) -> Result<Vec<ChecklistItem>, ApiError> {
        self.get_json(&format!("/api/stages/{}/checklist", segment(stage_id)))
            .await
    }

    pub async fn set_checklist_item(
        &self,
        stage_id: &str,
        item_id: &str,
        completed: bool,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/api/stages/{}/checklist/{}",
            segment(stage_id),
            segment(item_id)
        );
        self.send_unit(Method::PATCH, &path, Some(&ChecklistToggleRequest { completed }))
            .await
    }

    /// Persist a checklist order as a full list of item IDs.
    pub async fn reorder_checklist(&self, stage_id: &str, item_ids: &[String]) -> Result<(), ApiError> {
        let path = format!("/api/stages/{}/checklist/reorder", segment(stage_id));
        self.send_unit(Method::PATCH, &path, Some(&ChecklistReorderRequest { item_ids }))
            .await
    }

    pub async fn list_updates(&self, project_id: &str) -> Result<Vec<ProjectUpdate>, ApiError> {
        self.get_json(&format!("/api/projects/{}/updates", segment(project_id)))
            .await
    }

    pub async fn post_update(&self, project_id: &str, content: &str) -> Result<ProjectUpdate, ApiError> {
        let path = format!("/api/projects/{}/updates", segment(project_id));
        self.send_json(Method::POST, &path, &PostUpdateRequest { content })
            .await
    }
}
