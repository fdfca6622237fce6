use rand::prelude::*;

/// The desktop Chrome agent the web player is known to be served with.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.0.0 Safari/537.36";

const DESKTOP_OS: [&str; 5] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 10_14_6",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

/// Generates desktop browser user agents.
///
/// The playurl and dm endpoints reject requests that do not look like they
/// come from a desktop browser, so only desktop agents are produced.
pub struct UserAgentGenerator {
    rng: ThreadRng,
}

impl Default for UserAgentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentGenerator {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }

    pub fn generate(&mut self) -> String {
        match self.rng.random_range(0..3) {
            0 => self.generate_chrome(),
            1 => self.generate_firefox(),
            _ => self.generate_edge(),
        }
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn generate_chrome(&mut self) -> String {
        let os = self.pick(&DESKTOP_OS);
        let chrome_version = self.pick(&["120.0.0.0", "119.0.0.0", "118.0.0.0", "117.0.0.0"]);

        format!(
            "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{chrome_version} Safari/537.36"
        )
    }

    fn generate_firefox(&mut self) -> String {
        // firefox reports dotted macOS versions
        let os = self.pick(&[
            "Windows NT 10.0; Win64; x64",
            "Macintosh; Intel Mac OS X 10.15",
            "X11; Linux x86_64",
        ]);
        let firefox_version = self.pick(&["121.0", "120.0", "119.0", "118.0"]);

        format!("Mozilla/5.0 ({os}; rv:{firefox_version}) Gecko/20100101 Firefox/{firefox_version}")
    }

    fn generate_edge(&mut self) -> String {
        let os = self.pick(&DESKTOP_OS);
        let version = self.pick(&["119.0.0.0", "118.0.0.0", "117.0.0.0"]);

        format!(
            "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36 Edg/{version}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_desktop_user_agents() {
        let mut generator = UserAgentGenerator::new();

        for _ in 0..100 {
            let ua = generator.generate();
            assert!(ua.starts_with("Mozilla/5.0"));
            assert!(ua.contains("Chrome") || ua.contains("Firefox"));
            assert!(!ua.contains("Mobile"));
            assert!(!ua.contains("Android"));
        }
    }

    #[test]
    fn test_edge_user_agent_format() {
        let mut generator = UserAgentGenerator::new();
        let ua = generator.generate_edge();

        assert!(ua.contains("Edg/"));
        assert!(ua.contains("AppleWebKit"));
    }
}
