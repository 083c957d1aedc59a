//! robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate. Crawl-delay
//! is not part of that crate's matcher, so it is read here from the group
//! that applies to our agent.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Rules from one host's robots.txt
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt content; empty means everything is allowed
    content: String,
}

impl RobotsRules {
    pub fn parse(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given agent token
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Crawl-delay for the given agent token
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, agent: &str) -> Option<Duration> {
        let agent = agent.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group_agents.clear();
                        in_rules = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Some(delay) = parse_delay(value) else {
                        continue;
                    };
                    if group_agents.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        agent_delay = Some(delay);
                    } else if group_agents.iter().any(|ua| ua == "*") {
                        wildcard_delay = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

fn parse_delay(value: &str) -> Option<Duration> {
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.encuentromoda.com";

    #[test]
    fn test_allow_all() {
        let robots = RobotsRules::allow_all();
        assert!(robots.is_allowed(&format!("{}/any/path", URL), "TestBot"));
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_disallow_prefix() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /checkout\n");
        assert!(!robots.is_allowed(&format!("{}/checkout/cart", URL), "TestBot"));
        assert!(robots.is_allowed(&format!("{}/mujer/blusas", URL), "TestBot"));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /on/\nAllow: /on/demandware.store/\n");
        assert!(robots.is_allowed(
            &format!("{}/on/demandware.store/Sites-emo_pen-Site/es/Search-UpdateGrid", URL),
            "TestBot"
        ));
        assert!(!robots.is_allowed(&format!("{}/on/other", URL), "TestBot"));
    }

    #[test]
    fn test_specific_agent_group() {
        let robots = RobotsRules::parse("User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n");
        assert!(!robots.is_allowed(&format!("{}/page", URL), "TestBot"));
        assert!(robots.is_allowed(&format!("{}/page", URL), "OtherBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = RobotsRules::parse("User-agent: *\nCrawl-delay: 2\n");
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_crawl_delay_prefers_specific_agent() {
        let robots = RobotsRules::parse(
            "User-agent: *\nCrawl-delay: 5\n\nUser-agent: testbot\nCrawl-delay: 0.5\n",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let robots = RobotsRules::parse(
            "User-agent: OtherBot\nUser-agent: TestBot\nDisallow: /private\nCrawl-delay: 3\n",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("ThirdBot"), None);
    }

    #[test]
    fn test_crawl_delay_invalid_value_ignored() {
        let robots = RobotsRules::parse("User-agent: *\nCrawl-delay: soon\n");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }
}
