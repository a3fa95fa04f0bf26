use serde::Serialize;
use url::Url;

/// Identifier schemes recognised in harvested identifier values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierScheme {
    Doi,
    Handle,
    Ark,
    Urn,
    Purl,
    Orcid,
    Uuid,
    Url,
}

impl IdentifierScheme {
    pub fn detect(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("doi:") {
            return Some(Self::Doi);
        }
        if lower.starts_with("hdl:") {
            return Some(Self::Handle);
        }
        if lower.starts_with("ark:") {
            return Some(Self::Ark);
        }
        if lower.starts_with("urn:") {
            return Some(Self::Urn);
        }

        if let Some(url) = web_url(trimmed) {
            let host = url.host_str().unwrap_or_default();
            let path = url.path().to_ascii_lowercase();
            return Some(match host {
                "doi.org" | "dx.doi.org" | "www.doi.org" => Self::Doi,
                "hdl.handle.net" => Self::Handle,
                "orcid.org" | "www.orcid.org" => Self::Orcid,
                "n2t.net" => Self::Ark,
                _ if host == "purl.org" || host.ends_with(".purl.org") => Self::Purl,
                _ if path.contains("/ark:") => Self::Ark,
                _ => Self::Url,
            });
        }

        if is_bare_doi(&lower) {
            Some(Self::Doi)
        } else if is_orcid(&lower) {
            Some(Self::Orcid)
        } else if is_uuid(&lower) {
            Some(Self::Uuid)
        } else if is_bare_handle(&lower) {
            Some(Self::Handle)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Doi => "DOI",
            Self::Handle => "Handle",
            Self::Ark => "ARK",
            Self::Urn => "URN",
            Self::Purl => "PURL",
            Self::Orcid => "ORCID",
            Self::Uuid => "UUID",
            Self::Url => "URL",
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            Self::Doi | Self::Handle | Self::Ark | Self::Urn | Self::Purl
        )
    }

    /// Every recognised scheme is globally unique; local ids are not recognised at all.
    pub fn is_globally_unique(&self) -> bool {
        true
    }

    /// HTTP(S) location the identifier resolves through, if any.
    pub fn resolution_url(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if let Some(url) = web_url(trimmed) {
            return matches!(url.scheme(), "http" | "https" | "ftp").then(|| trimmed.to_string());
        }

        match self {
            Self::Doi => Some(format!("https://doi.org/{}", strip_prefix(trimmed, "doi:"))),
            Self::Handle => Some(format!(
                "https://hdl.handle.net/{}",
                strip_prefix(trimmed, "hdl:")
            )),
            Self::Ark => Some(format!("https://n2t.net/{trimmed}")),
            Self::Orcid => Some(format!("https://orcid.org/{trimmed}")),
            Self::Urn | Self::Uuid | Self::Purl | Self::Url => None,
        }
    }
}

fn strip_prefix<'a>(value: &'a str, prefix: &str) -> &'a str {
    match (value.get(..prefix.len()), value.get(prefix.len()..)) {
        (Some(head), Some(rest)) if head.eq_ignore_ascii_case(prefix) => rest.trim_start(),
        _ => value,
    }
}

/// Parses `value` as an absolute URL with a host. Bare identifiers such as
/// `10.1234/x` or `urn:isbn:123` yield `None`.
pub fn web_url(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    url.host_str().is_some_and(|host| !host.is_empty()).then_some(url)
}

/// Lower-cased scheme of a URL with a host.
pub fn url_scheme(value: &str) -> Option<String> {
    web_url(value).map(|url| url.scheme().to_string())
}

/// Host of a URL. IPv6 hosts keep their brackets.
pub fn url_host(value: &str) -> Option<String> {
    web_url(value).and_then(|url| url.host_str().map(str::to_string))
}

/// Lower-cased extension of the last path segment of a file name or URL.
pub fn file_extension(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let segment = match web_url(trimmed) {
        Some(url) => url.path_segments().and_then(|segments| segments.last())?.to_string(),
        None => {
            let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
            without_query.rsplit('/').next()?.to_string()
        }
    };
    let (stem, extension) = segment.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !extension.is_empty()
        && extension.len() <= 8
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| extension.to_ascii_lowercase())
}

fn is_bare_doi(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("10.") else {
        return false;
    };
    let Some((registrant, suffix)) = rest.split_once('/') else {
        return false;
    };
    registrant.len() >= 4
        && registrant.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !suffix.trim().is_empty()
}

/// `prefix/suffix` where the prefix is dot-separated digit groups. A purely
/// numeric suffix must be at least four digits, and date-like values are rejected.
fn is_bare_handle(value: &str) -> bool {
    let Some((prefix, suffix)) = value.split_once('/') else {
        return false;
    };
    let prefix_ok = prefix
        .split('.')
        .all(|group| !group.is_empty() && group.chars().all(|c| c.is_ascii_digit()));
    let suffix_ok = !suffix.is_empty()
        && !suffix.contains(char::is_whitespace)
        && (suffix.len() >= 4 || !suffix.chars().all(|c| c.is_ascii_digit()));
    prefix_ok && suffix_ok && !is_date_like(value)
}

/// `yyyy/mm`, `yyyy/mm/dd` and the `-` separated equivalents.
fn is_date_like(value: &str) -> bool {
    let parts: Vec<&str> = value.split(['/', '-']).collect();
    let numeric = |part: &str, max_len: usize| {
        !part.is_empty() && part.len() <= max_len && part.chars().all(|c| c.is_ascii_digit())
    };
    (2..=3).contains(&parts.len())
        && parts[0].len() == 4
        && numeric(parts[0], 4)
        && parts[1..].iter().all(|part| numeric(part, 2))
}

fn is_orcid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    groups.len() == 4
        && groups.iter().enumerate().all(|(idx, group)| {
            group.len() == 4
                && group.chars().enumerate().all(|(pos, c)| {
                    c.is_ascii_digit() || (idx == 3 && pos == 3 && c == 'x')
                })
        })
}

fn is_uuid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_schemes() {
        assert_eq!(IdentifierScheme::detect("10.1234/x"), Some(IdentifierScheme::Doi));
        assert_eq!(
            IdentifierScheme::detect("https://doi.org/10.20350/digitalCSIC/8537"),
            Some(IdentifierScheme::Doi)
        );
        assert_eq!(
            IdentifierScheme::detect("http://hdl.handle.net/10261/157765"),
            Some(IdentifierScheme::Handle)
        );
        assert_eq!(IdentifierScheme::detect("10261/157765"), Some(IdentifierScheme::Handle));
        assert_eq!(
            IdentifierScheme::detect("0000-0002-1825-009X"),
            Some(IdentifierScheme::Orcid)
        );
        assert_eq!(
            IdentifierScheme::detect("urn:nbn:de:101:1-2017"),
            Some(IdentifierScheme::Urn)
        );
        assert_eq!(
            IdentifierScheme::detect("https://example.org/item/5"),
            Some(IdentifierScheme::Url)
        );
        assert_eq!(IdentifierScheme::detect("local-record-17"), None);
    }

    #[test]
    fn doi_resolver_with_www_host_is_a_doi() {
        assert_eq!(
            IdentifierScheme::detect("https://www.doi.org/10.1234/x"),
            Some(IdentifierScheme::Doi)
        );
        assert_eq!(
            IdentifierScheme::detect("HTTPS://DX.DOI.ORG/10.1234/x"),
            Some(IdentifierScheme::Doi)
        );
    }

    #[test]
    fn dates_and_short_numeric_pairs_are_not_handles() {
        assert_eq!(IdentifierScheme::detect("2021/05"), None);
        assert_eq!(IdentifierScheme::detect("2021/05/12"), None);
        assert_eq!(IdentifierScheme::detect("3/4"), None);
        assert_eq!(IdentifierScheme::detect("10261/157765"), Some(IdentifierScheme::Handle));
        assert_eq!(
            IdentifierScheme::detect("20.500.12345/abc"),
            Some(IdentifierScheme::Handle)
        );
        assert_eq!(IdentifierScheme::detect("1.2./x"), None);
    }

    #[test]
    fn ipv6_hosts_and_ports_are_parsed() {
        assert_eq!(
            url_host("https://[2001:db8::1]/data.csv").as_deref(),
            Some("[2001:db8::1]")
        );
        assert_eq!(
            file_extension("https://[2001:db8::1]/data.csv").as_deref(),
            Some("csv")
        );
        assert_eq!(
            url_host("https://user@repo.example.org:8443/x").as_deref(),
            Some("repo.example.org")
        );
        assert_eq!(url_scheme("FTP://mirror.example.org/a.nc").as_deref(), Some("ftp"));
    }

    #[test]
    fn bare_identifiers_are_not_urls() {
        assert_eq!(url_scheme("10.1234/x"), None);
        assert_eq!(url_scheme("urn:isbn:123"), None);
        assert_eq!(url_host("CC-BY-4.0"), None);
        assert_eq!(
            IdentifierScheme::detect("https://example.org/ark:/13030/tf5p30086k"),
            Some(IdentifierScheme::Ark)
        );
    }

    #[test]
    fn urls_are_unique_but_not_persistent() {
        let scheme = IdentifierScheme::detect("https://example.org/item/5").expect("url");
        assert!(scheme.is_globally_unique());
        assert!(!scheme.is_persistent());
        assert!(IdentifierScheme::Doi.is_persistent());
    }

    #[test]
    fn doi_resolves_through_doi_org() {
        assert_eq!(
            IdentifierScheme::Doi.resolution_url("doi:10.1234/x").as_deref(),
            Some("https://doi.org/10.1234/x")
        );
        assert_eq!(IdentifierScheme::Urn.resolution_url("urn:isbn:123"), None);
    }

    #[test]
    fn extension_ignores_query_and_host() {
        assert_eq!(
            file_extension("https://repo.org/files/data.CSV?download=1").as_deref(),
            Some("csv")
        );
        assert_eq!(file_extension("https://repo.org"), None);
        assert_eq!(file_extension("results.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("https://repo.org/files/"), None);
        assert_eq!(file_extension("data/raw.nc#frag").as_deref(), Some("nc"));
    }
}
