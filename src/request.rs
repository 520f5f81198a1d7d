//! Derives flat defines from HTTP-like request headers.
//!
//! This is the only place that knows about headers and cookies; the
//! preprocessor itself only ever sees the resulting [`Defines`].

use crate::defines::Defines;
use crate::errors::{PreprocessError, Result};

const MOBILE_MARKERS: [&str; 2] = ["mobi", "android"];
const MOBILE_DEFAULT_WIDTH: i64 = 360;
const DESKTOP_DEFAULT_WIDTH: i64 = 1920;

/// Request headers with case-insensitive names. Later values for the same
/// name replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    inner: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.into();
        match self.inner.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Parse a `Name: value` line.
    pub fn insert_line(&mut self, line: &str) -> Result<()> {
        let (name, value) = line.split_once(':').ok_or_else(|| {
            PreprocessError::Config(format!("header `{line}` is not of the form `Name: value`"))
        })?;
        if name.trim().is_empty() {
            return Err(PreprocessError::Config(format!("header `{line}` has no name")));
        }
        self.insert(name, value.trim());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.inner
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of cookie `name` from the `cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.get("cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| k.trim() == name)
            .map(|(_, v)| v.trim())
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = RequestHeaders::new();
        for (n, v) in iter {
            headers.insert(n.as_ref(), v);
        }
        headers
    }
}

/// Map request signals to the defines an edge template is written against.
pub fn derive_defines(headers: &RequestHeaders) -> Defines {
    let mut defines = Defines::new();

    let user_agent = headers.get("user-agent").unwrap_or_default().to_ascii_lowercase();
    let is_mobile = MOBILE_MARKERS.iter().any(|m| user_agent.contains(m));
    defines.insert("device.isMobile", is_mobile);

    let default_width = if is_mobile {
        MOBILE_DEFAULT_WIDTH
    } else {
        DESKTOP_DEFAULT_WIDTH
    };
    let width = headers
        .get("x-screen-width")
        .and_then(leading_int)
        .unwrap_or(default_width);
    defines.insert("device.screenWidth", width);

    let language = headers
        .get("accept-language")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("en");
    defines.insert("user.language", language);

    defines.insert("user.isLoggedIn", headers.cookie("session_token") == Some("active"));

    let group = headers
        .cookie("ab_group")
        .filter(|g| !g.is_empty())
        .unwrap_or("A");
    defines.insert("experiment.group", group);

    defines.insert(
        "featureFlags.newUserProfile",
        headers.get("x-ff-new-profile") == Some("true"),
    );

    defines
}

/// Leading optional sign and digits, like `parseInt("375px", 10)`.
/// Values beyond `i64` saturate rather than falling back to the default.
fn leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let sign_len = usize::from(raw.starts_with(['-', '+']));
    let end = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |end| end + sign_len);
    if end == sign_len {
        return None;
    }
    match raw[..end].parse::<i64>() {
        Ok(n) => Some(n),
        // only digits remain, so the sole failure is overflow
        Err(_) if raw.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scalar;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_names_are_case_insensitive() {
        let mut h = RequestHeaders::new();
        h.insert_line("User-Agent: Foo").unwrap();
        assert_eq!(h.get("user-agent"), Some("Foo"));
        assert!(h.insert_line("no colon").is_err());
        assert!(h.insert_line(": empty").is_err());
    }

    #[test]
    fn cookie_lookup() {
        let h: RequestHeaders = [("Cookie", "session_token=active; ab_group=B")].into_iter().collect();
        assert_eq!(h.cookie("ab_group"), Some("B"));
        assert_eq!(h.cookie("session_token"), Some("active"));
        assert_eq!(h.cookie("missing"), None);
    }

    #[test]
    fn parse_int_prefix() {
        assert_eq!(leading_int("375"), Some(375));
        assert_eq!(leading_int(" 375px"), Some(375));
        assert_eq!(leading_int("-5"), Some(-5));
        assert_eq!(leading_int("wide"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("99999999999999999999px"), Some(i64::MAX));
        assert_eq!(leading_int("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn empty_request_defaults_to_desktop() {
        let d = derive_defines(&RequestHeaders::new());
        assert_eq!(d.get("device.isMobile"), Some(&Scalar::Bool(false)));
        assert_eq!(d.get("device.screenWidth"), Some(&Scalar::from(1920i64)));
        assert_eq!(d.get("user.language"), Some(&Scalar::from("en")));
        assert_eq!(d.get("user.isLoggedIn"), Some(&Scalar::Bool(false)));
        assert_eq!(d.get("experiment.group"), Some(&Scalar::from("A")));
        assert_eq!(d.get("featureFlags.newUserProfile"), Some(&Scalar::Bool(false)));
    }

    #[test]
    fn unparsable_width_falls_back() {
        let h: RequestHeaders = [("user-agent", "Android"), ("x-screen-width", "wide")]
            .into_iter()
            .collect();
        let d = derive_defines(&h);
        assert_eq!(d.get("device.screenWidth"), Some(&Scalar::from(360i64)));
    }
}
