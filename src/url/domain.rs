use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use encuentro_scraper::url::extract_domain;
///
/// let url = Url::parse("https://WWW.EncuentroModa.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.encuentromoda.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks a host against the allowed domain list
///
/// An entry allows the domain itself and every subdomain of it, so
/// `encuentromoda.com` admits `www.encuentromoda.com`. A leading `*.` on an
/// entry is accepted and means the same thing.
pub fn is_allowed_domain(domain: &str, allowed: &[String]) -> bool {
    let domain = domain.to_lowercase();

    allowed.iter().any(|entry| {
        let entry = entry.trim().to_lowercase();
        let base = entry.strip_prefix("*.").unwrap_or(&entry);

        !base.is_empty()
            && (domain == base
                || domain
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["encuentromoda.com".to_string()]
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ip_host() {
        let url = Url::parse("http://127.0.0.1:3000/grid").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_exact_domain_allowed() {
        assert!(is_allowed_domain("encuentromoda.com", &allowed()));
    }

    #[test]
    fn test_subdomains_allowed() {
        assert!(is_allowed_domain("www.encuentromoda.com", &allowed()));
        assert!(is_allowed_domain("static.cdn.encuentromoda.com", &allowed()));
    }

    #[test]
    fn test_lookalike_domains_rejected() {
        assert!(!is_allowed_domain("notencuentromoda.com", &allowed()));
        assert!(!is_allowed_domain("encuentromoda.com.co", &allowed()));
        assert!(!is_allowed_domain("facebook.com", &allowed()));
    }

    #[test]
    fn test_wildcard_entry() {
        let allowed = vec!["*.encuentromoda.com".to_string()];
        assert!(is_allowed_domain("encuentromoda.com", &allowed));
        assert!(is_allowed_domain("www.encuentromoda.com", &allowed));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_allowed_domain("WWW.EncuentroModa.COM", &allowed()));
    }

    #[test]
    fn test_empty_list_allows_nothing() {
        assert!(!is_allowed_domain("encuentromoda.com", &[]));
    }
}
