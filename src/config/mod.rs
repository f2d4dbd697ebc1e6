mod settings;

pub use settings::{
    ConfirmationConfig, ConfirmationPolicy, LogFormat, LoggingConfig, NotificationsConfig,
    ServerConfig, Settings, SseConfig, ToastConfig,
};
