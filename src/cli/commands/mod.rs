use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn validator_ttl_seconds(min: i64, max: i64) -> ValueParser {
    ValueParser::from(move |ttl: &str| -> std::result::Result<i64, String> {
        let parsed = ttl
            .parse::<i64>()
            .map_err(|_| "ttl must be a number of seconds".to_string())?;
        if (min..=max).contains(&parsed) {
            Ok(parsed)
        } else {
            Err(format!("ttl must be between {min} and {max} seconds"))
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("laboro")
        .about("Lab tasks portal backend")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("LABORO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .default_value("sqlite://laboro.db?mode=rwc")
                .env("LABORO_DSN"),
        )
        .arg(
            Arg::new("secret")
                .short('s')
                .long("secret")
                .help("Secret used to sign access and refresh tokens")
                .env("LABORO_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Frontend origin allowed by CORS; https enables the Secure cookie flag")
                .default_value("http://localhost:5173")
                .env("LABORO_FRONTEND_URL"),
        )
        .arg(
            Arg::new("access-token-ttl")
                .long("access-token-ttl")
                .help("Access token lifetime in seconds (300-3600)")
                .default_value("900")
                .env("LABORO_ACCESS_TOKEN_TTL")
                .value_parser(validator_ttl_seconds(300, 3600)),
        )
        .arg(
            Arg::new("refresh-token-ttl")
                .long("refresh-token-ttl")
                .help("Refresh token lifetime in seconds (1-30 days)")
                .default_value("604800")
                .env("LABORO_REFRESH_TOKEN_TTL")
                .value_parser(validator_ttl_seconds(86_400, 2_592_000)),
        )
        .arg(
            Arg::new("rotate-refresh")
                .long("rotate-refresh")
                .help("Rotate the refresh token on every successful refresh, revoking the old one")
                .env("LABORO_ROTATE_REFRESH")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding lab task attachments")
                .default_value("data")
                .env("LABORO_DATA_DIR"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("LABORO_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
