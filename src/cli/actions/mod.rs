pub mod server;

use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        secret: SecretString,
        frontend_url: String,
        access_token_ttl: i64,
        refresh_token_ttl: i64,
        rotate_refresh: bool,
        data_dir: PathBuf,
    },
}
