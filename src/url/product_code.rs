use once_cell::sync::Lazy;
use regex::Regex;

/// Product codes look like `H242899ZA01390`: an `H`, digits, then uppercase alphanumerics
static PRODUCT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"H\d+[A-Z0-9]+").expect("product code pattern is valid"));

/// Length of the code prefix kept in the filename (`H242899ZA01390` -> `H242899ZA013`)
const CODE_PREFIX_LEN: usize = 12;

/// Characters replaced by `_` in the fallback name
const UNSAFE_CHARS: &[char] = &['/', ':', '?', '&', '='];

/// Maps a URL to the filename its page is stored under
///
/// The first product code found in the URL wins, truncated to its first
/// 12 characters. URLs without a product code fall back to a sanitized form
/// of the URL itself. The mapping is deterministic but not injective: two
/// URLs sharing a code prefix land in the same file and the last write wins.
///
/// # Examples
///
/// ```
/// use ledger_crawl::url::filename_for;
///
/// assert_eq!(
///     filename_for("https://shop.example.com/p/H242899ZA01390?color=red"),
///     "H242899ZA013.html"
/// );
/// assert_eq!(
///     filename_for("https://example.com/about?lang=en"),
///     "example.com_about_lang_en.html"
/// );
/// ```
pub fn filename_for(url: &str) -> String {
    if let Some(found) = PRODUCT_CODE.find(url) {
        // The match is pure ASCII, so a byte slice is a char slice
        let code = found.as_str();
        let end = code.len().min(CODE_PREFIX_LEN);
        return format!("{}.html", &code[..end]);
    }

    sanitized_filename(url)
}

/// Fallback naming: drop the scheme, flatten separators, trim stray underscores
fn sanitized_filename(url: &str) -> String {
    let stripped = url.replace("https://", "").replace("http://", "");
    let flattened: String = stripped
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect();

    format!("{}.html", flattened.trim_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_code_truncated_to_twelve() {
        assert_eq!(
            filename_for("https://www.example.com/product/H242899ZA01390"),
            "H242899ZA013.html"
        );
    }

    #[test]
    fn test_product_code_ignores_query_noise() {
        let plain = filename_for("https://example.com/H242899ZA01440");
        let noisy = filename_for("https://example.com/H242899ZA01440?ref=home&utm_source=x#top");
        assert_eq!(plain, noisy);
        assert_eq!(plain, "H242899ZA014.html");
    }

    #[test]
    fn test_short_product_code_kept_whole() {
        assert_eq!(
            filename_for("https://example.com/item/H011682UK05/"),
            "H011682UK05.html"
        );
    }

    #[test]
    fn test_first_product_code_wins() {
        assert_eq!(
            filename_for("https://example.com/H111A/related/H222B"),
            "H111A.html"
        );
    }

    #[test]
    fn test_lowercase_h_is_not_a_code() {
        assert_eq!(
            filename_for("https://example.com/h12345AB"),
            "example.com_h12345AB.html"
        );
    }

    #[test]
    fn test_h_without_trailing_alnum_is_not_a_code() {
        // The pattern needs at least one character after the digit run
        assert_eq!(filename_for("http://example.com/H1"), "example.com_H1.html");
    }

    #[test]
    fn test_fallback_strips_scheme_and_separators() {
        let name = filename_for("https://example.com/search?q=shoes&page=2");
        assert_eq!(name, "example.com_search_q_shoes_page_2.html");
        for c in UNSAFE_CHARS {
            assert!(!name.contains(*c), "fallback name still contains {:?}", c);
        }
    }

    #[test]
    fn test_fallback_trims_underscores() {
        assert_eq!(filename_for("http://example.com/"), "example.com.html");
        assert_eq!(filename_for("/path/"), "path.html");
    }

    #[test]
    fn test_fallback_keeps_port_separator_flattened() {
        assert_eq!(
            filename_for("http://127.0.0.1:8080/page"),
            "127.0.0.1_8080_page.html"
        );
    }

    #[test]
    fn test_filename_is_deterministic() {
        let url = "https://example.com/catalog?id=42";
        assert_eq!(filename_for(url), filename_for(url));
    }
}
