use serde::{Deserialize, Serialize};

/// One progress event on the wire.
///
/// `TaskUpdate` tracks an in-flight submission; `Notification` is a terminal
/// announcement that also lands in the notification inbox. The task id in
/// the routing key falls back from sub-unit to artifact so artifact-level
/// stages and sub-unit stages share one addressing scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EventMessage {
    #[serde(rename = "taskUpdate")]
    TaskUpdate {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
        state: String,
    },
    #[serde(rename = "notification")]
    Notification {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
        state: String,
    },
}

impl EventMessage {
    pub fn task_update(
        username: impl Into<String>,
        module_id: Option<String>,
        project_id: Option<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::TaskUpdate {
            username: username.into(),
            module_id,
            project_id,
            state: state.into(),
        }
    }

    pub fn notification(
        username: impl Into<String>,
        module_id: Option<String>,
        project_id: Option<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::Notification {
            username: username.into(),
            module_id,
            project_id,
            state: state.into(),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::TaskUpdate { username, .. } | Self::Notification { username, .. } => username,
        }
    }

    pub fn state(&self) -> &str {
        match self {
            Self::TaskUpdate { state, .. } | Self::Notification { state, .. } => state,
        }
    }

    /// Wire-format type tag, also used as a metric label.
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::TaskUpdate { .. } => "taskUpdate",
            Self::Notification { .. } => "notification",
        }
    }

    /// Key the dispatcher uses to find the task-scoped connections.
    ///
    /// Sub-unit id wins over artifact id; an event carrying neither is
    /// addressed to the user alone.
    pub fn task_routing_key(&self) -> Option<RoutingKey> {
        let (username, module_id, project_id) = match self {
            Self::TaskUpdate {
                username,
                module_id,
                project_id,
                ..
            }
            | Self::Notification {
                username,
                module_id,
                project_id,
                ..
            } => (username, module_id, project_id),
        };
        let task_id = module_id.as_ref().or(project_id.as_ref())?;
        Some(RoutingKey::Task {
            username: username.clone(),
            task_id: task_id.clone(),
        })
    }

    /// Key for the user's notification connections.
    pub fn user_routing_key(&self) -> RoutingKey {
        RoutingKey::User {
            username: self.username().to_string(),
        }
    }
}

/// Address of a set of live websocket connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    /// A task progress socket, opened against one artifact or sub-unit.
    Task { username: String, task_id: String },
    /// A user's notification socket.
    User { username: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_tags_type() {
        let msg = EventMessage::task_update("alice", Some("m1".into()), None, "Generating Content");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "taskUpdate");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["module_id"], "m1");
        assert_eq!(json["state"], "Generating Content");
        assert!(json.get("project_id").is_none());

        let msg = EventMessage::notification("alice", None, Some("p1".into()), "Published");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "notification");
    }

    #[test]
    fn test_task_routing_key_prefers_module() {
        let msg = EventMessage::task_update("alice", Some("m1".into()), Some("p1".into()), "s");
        assert_eq!(
            msg.task_routing_key(),
            Some(RoutingKey::Task {
                username: "alice".into(),
                task_id: "m1".into()
            })
        );

        let msg = EventMessage::task_update("alice", None, Some("p1".into()), "s");
        assert_eq!(
            msg.task_routing_key(),
            Some(RoutingKey::Task {
                username: "alice".into(),
                task_id: "p1".into()
            })
        );

        let msg = EventMessage::task_update("alice", None, None, "s");
        assert!(msg.task_routing_key().is_none());
    }
}
