use std::fmt;

/// Platform information for artifact selection
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Spellings of the operating system found in release artifact names.
    pub fn os_tokens(&self) -> Vec<&str> {
        match self.os.as_str() {
            "macos" | "darwin" => vec!["darwin", "macos", "apple"],
            "linux" => vec!["linux"],
            "windows" => vec!["windows"],
            os => vec![os],
        }
    }

    /// Spellings of the CPU architecture found in release artifact names.
    pub fn arch_tokens(&self) -> Vec<&str> {
        match self.arch.as_str() {
            "x86_64" | "amd64" => vec!["amd64", "x86_64", "x64"],
            "aarch64" | "arm64" => vec!["arm64", "aarch64"],
            "x86" | "i686" | "386" => vec!["386", "i386", "i686"],
            "arm" => vec!["armv7", "armv6", "armhf", "arm"],
            arch => vec![arch],
        }
    }

    /// Whether an artifact name mentions both this OS and this architecture.
    /// Matching is case-insensitive. An architecture spelling directly
    /// followed by a digit is a different architecture (`arm` in `arm64`).
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.os_tokens().iter().any(|t| name.contains(t))
            && self.arch_tokens().iter().any(|t| contains_arch(&name, t))
    }
}

fn contains_arch(name: &str, token: &str) -> bool {
    name.match_indices(token).any(|(at, _)| {
        !name[at + token.len()..]
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_digit())
    })
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
