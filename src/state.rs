use std::sync::Arc;

use crate::{
    authz::{Policy, RolePolicy},
    config::FulfillmentConfig,
    db::OrmConn,
    services::{
        gateway::{PaymentGateway, SimulatedGateway},
        matching::{BonusPolicy, NoBonus},
        pricing::{BaselineFees, FeePolicy},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub jwt_secret: Arc<str>,
    pub config: Arc<FulfillmentConfig>,
    pub policy: Arc<dyn Policy>,
    pub fees: Arc<dyn FeePolicy>,
    pub bonus: Arc<dyn BonusPolicy>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// State with the launch policies: role-based access, no fees, no bonus,
    /// simulated payment provider.
    pub fn new(orm: OrmConn, jwt_secret: &str, config: FulfillmentConfig) -> Self {
        Self {
            orm,
            jwt_secret: Arc::from(jwt_secret),
            config: Arc::new(config),
            policy: Arc::new(RolePolicy),
            fees: Arc::new(BaselineFees),
            bonus: Arc::new(NoBonus),
            gateway: Arc::new(SimulatedGateway),
        }
    }

    pub fn with_gateway(mut self, gateway: impl PaymentGateway + 'static) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    pub fn with_fees(mut self, fees: impl FeePolicy + 'static) -> Self {
        self.fees = Arc::new(fees);
        self
    }

    pub fn with_bonus(mut self, bonus: impl BonusPolicy + 'static) -> Self {
        self.bonus = Arc::new(bonus);
        self
    }

    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }
}
