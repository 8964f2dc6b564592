/// Identifies the tenant the gateway acts for. Only consulted when routing
/// through the on-premise tunnel, where the proxy needs the consumer account.
pub trait TenantContext: Send + Sync {
    fn account_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticTenant {
    account_id: Option<String>,
}

impl StaticTenant {
    pub fn new(account_id: Option<String>) -> Self {
        StaticTenant { account_id }
    }
}

impl TenantContext for StaticTenant {
    fn account_id(&self) -> Option<String> {
        self.account_id.clone()
    }
}
