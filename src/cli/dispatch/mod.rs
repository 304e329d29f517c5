use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        secret: matches
            .get_one("secret")
            .map(|s: &String| SecretString::from(s.to_string()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --secret"))?,
        frontend_url: matches
            .get_one("frontend-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --frontend-url"))?,
        access_token_ttl: matches
            .get_one::<i64>("access-token-ttl")
            .copied()
            .unwrap_or(900),
        refresh_token_ttl: matches
            .get_one::<i64>("refresh-token-ttl")
            .copied()
            .unwrap_or(604_800),
        rotate_refresh: matches.get_flag("rotate-refresh"),
        data_dir: matches
            .get_one("data-dir")
            .map(|s: &String| PathBuf::from(s))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --data-dir"))?,
    })
}
