mod dispatcher;

pub use dispatcher::LoggingNotificationDispatcher;
