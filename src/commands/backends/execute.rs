use serde::Serialize;

use super::BackendsCmd;
use crate::backends::{BackendId, Render};

#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub name: BackendId,
    pub description: &'static str,
    /// Default casing per name kind
    pub casing: String,
}

/// Result of the backends command execution
#[derive(Debug, Serialize)]
pub struct BackendList {
    pub backends: Vec<BackendInfo>,
}

impl BackendsCmd {
    /// Backends need no data source, so this bypasses `Execute`.
    pub fn list(self) -> BackendList {
        let backends = BackendId::ALL
            .into_iter()
            .map(|id| {
                let names = id.backend().default_formatters();
                BackendInfo {
                    name: id,
                    description: id.description(),
                    casing: format!(
                        "entity={} attribute={} relation={} enum={}",
                        names.entity.name(),
                        names.attribute.name(),
                        names.relation.name(),
                        names.enum_type.name()
                    ),
                }
            })
            .collect();
        BackendList { backends }
    }
}
