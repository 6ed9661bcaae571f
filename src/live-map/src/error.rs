use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to load settings"))]
    Config {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: config::ConfigError,
    },
    #[snafu(display("APP_ENVIRONMENT is not set"))]
    MissingEnvironment {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: std::env::VarError,
    },
    #[snafu(display("Invalid APP_ENVIRONMENT '{value}'"))]
    InvalidEnvironment {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Invalid url '{url}'"))]
    InvalidUrl {
        #[snafu(implicit)]
        location: Location,
        url: String,
        #[snafu(source)]
        error: url::ParseError,
    },
    #[snafu(display("Failed to create HTTP client"))]
    HttpClient {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: http_client::Error,
    },
    #[snafu(display("Invalid push channel configuration"))]
    PushChannel {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: tracking_core::ChannelError,
    },
}
