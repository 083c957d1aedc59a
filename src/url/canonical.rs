use crate::UrlError;
use url::Url;

/// Produces the canonical form of a URL for duplicate detection
///
/// Two URLs with the same canonical form are treated as the same page, so
/// the crawl fetches it once.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Lowercase the host (the `url` crate does this while parsing)
/// 4. Resolve `.` and `..` path segments (also done while parsing)
/// 5. Remove the fragment
/// 6. Sort query parameters by key, then value; drop an empty query
///
/// The scheme, `www.` prefix and trailing slashes are kept as they are: the
/// site serves different content for some of those variants.
///
/// # Examples
///
/// ```
/// use encuentro_scraper::url::canonicalize_url;
///
/// let url = canonicalize_url("https://WWW.Example.com/grid?sz=500&cgid=01#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/grid?cgid=01&sz=500");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}
