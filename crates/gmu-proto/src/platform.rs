use std::path::PathBuf;

/// Default port of the Gmu remote-control socket.
pub const SERVER_PORT: u16 = 4680;
const SERVER_HOST: &str = "127.0.0.1";

pub fn default_endpoint() -> String {
    format!("{}:{}", SERVER_HOST, SERVER_PORT)
}

pub fn data_dir() -> PathBuf {
    // Use ~/.local/share/gmu-remote/ (XDG standard) on unix rather than the
    // macOS Application Support folder, for consistency across hosts.
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("gmu-remote")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gmu-remote")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("gmu-remote")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gmu-remote")
    }
}
