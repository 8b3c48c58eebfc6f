// src/api/admin.rs
// Admin console endpoints: user/agent/archetype CRUD, the paginated AI
// request audit log, and per-agent-type behavior rules.

use async_trait::async_trait;

use crate::api::client::HttpClient;
use crate::api::error::ApiResult;
use crate::api::types::{
    AdminUser, AgentDraft, AgentInstance, Archetype, ArchetypeDraft, BehaviorRules,
    RequestLogPage, RequestLogQuery, UserDraft,
};

#[async_trait]
pub trait AdminApi: Send + Sync {
    // Users
    async fn list_users(&self) -> ApiResult<Vec<AdminUser>>;
    async fn create_user(&self, draft: &UserDraft) -> ApiResult<AdminUser>;
    async fn update_user(&self, id: i64, draft: &UserDraft) -> ApiResult<AdminUser>;
    async fn delete_user(&self, id: i64) -> ApiResult<()>;

    // Agent instances
    async fn list_agents(&self) -> ApiResult<Vec<AgentInstance>>;
    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<AgentInstance>;
    async fn update_agent(&self, id: i64, draft: &AgentDraft) -> ApiResult<AgentInstance>;
    async fn delete_agent(&self, id: i64) -> ApiResult<()>;

    // Archetypes
    async fn list_archetypes(&self) -> ApiResult<Vec<Archetype>>;
    async fn create_archetype(&self, draft: &ArchetypeDraft) -> ApiResult<Archetype>;
    async fn update_archetype(&self, id: i64, draft: &ArchetypeDraft) -> ApiResult<Archetype>;
    async fn delete_archetype(&self, id: i64) -> ApiResult<()>;

    /// Paginated audit log of AI provider requests.
    async fn request_log(&self, query: &RequestLogQuery) -> ApiResult<RequestLogPage>;

    /// `None` when no rules are configured for the agent type yet (the
    /// backend answers 404 for that, which is a valid empty state).
    async fn behavior_rules(&self, agent_type_id: i64) -> ApiResult<Option<BehaviorRules>>;
    async fn put_behavior_rules(
        &self,
        agent_type_id: i64,
        rules: &BehaviorRules,
    ) -> ApiResult<BehaviorRules>;
}

#[async_trait]
impl AdminApi for HttpClient {
    async fn list_users(&self) -> ApiResult<Vec<AdminUser>> {
        self.get_json_with_retry("admin/users", &[]).await
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<AdminUser> {
        self.post_json("admin/users", draft).await
    }

    async fn update_user(&self, id: i64, draft: &UserDraft) -> ApiResult<AdminUser> {
        self.put_json(&format!("admin/users/{id}"), draft).await
    }

    async fn delete_user(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("admin/users/{id}")).await
    }

    async fn list_agents(&self) -> ApiResult<Vec<AgentInstance>> {
        self.get_json_with_retry("admin/agents", &[]).await
    }

    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<AgentInstance> {
        self.post_json("admin/agents", draft).await
    }

    async fn update_agent(&self, id: i64, draft: &AgentDraft) -> ApiResult<AgentInstance> {
        self.put_json(&format!("admin/agents/{id}"), draft).await
    }

    async fn delete_agent(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("admin/agents/{id}")).await
    }

    async fn list_archetypes(&self) -> ApiResult<Vec<Archetype>> {
        self.get_json_with_retry("admin/archetypes", &[]).await
    }

    async fn create_archetype(&self, draft: &ArchetypeDraft) -> ApiResult<Archetype> {
        self.post_json("admin/archetypes", draft).await
    }

    async fn update_archetype(&self, id: i64, draft: &ArchetypeDraft) -> ApiResult<Archetype> {
        self.put_json(&format!("admin/archetypes/{id}"), draft).await
    }

    async fn delete_archetype(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("admin/archetypes/{id}")).await
    }

    async fn request_log(&self, query: &RequestLogQuery) -> ApiResult<RequestLogPage> {
        let pairs = query.to_query();
        self.get_json_with_retry("admin/requests", &pairs).await
    }

    async fn behavior_rules(&self, agent_type_id: i64) -> ApiResult<Option<BehaviorRules>> {
        match self
            .get_json(&format!("admin/agent-types/{agent_type_id}/rules"), &[])
            .await
        {
            Ok(rules) => Ok(Some(rules)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn put_behavior_rules(
        &self,
        agent_type_id: i64,
        rules: &BehaviorRules,
    ) -> ApiResult<BehaviorRules> {
        self.put_json(&format!("admin/agent-types/{agent_type_id}/rules"), rules)
            .await
    }
}
