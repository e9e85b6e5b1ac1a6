mod gateway;

pub use gateway::HttpPaymentGateway;
