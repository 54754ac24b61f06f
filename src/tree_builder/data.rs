// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data that is known at compile-time and hard-coded into the program.

use crate::interface::QuirksMode::{self, LimitedQuirks, NoQuirks, Quirks};
use crate::tokenizer::Doctype;

// These should all be lowercase, for ASCII-case-insensitive matching.
static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

static QUIRKY_PUBLIC_MATCHES: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

static QUIRKY_SYSTEM_MATCHES: &[&str] =
    &["http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"];

static LIMITED_QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

static HTML4_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

fn contains_ignore_ascii_case(haystack: &[&str], needle: &str) -> bool {
    haystack.iter().any(|s| s.eq_ignore_ascii_case(needle))
}

fn has_prefix_ignore_ascii_case(prefixes: &[&str], s: &str) -> bool {
    let s = s.as_bytes();
    prefixes
        .iter()
        .any(|p| s.len() >= p.len() && s[..p.len()].eq_ignore_ascii_case(p.as_bytes()))
}

fn is_doctype_ok(doctype: &Doctype) -> bool {
    let name_ok = matches!(&doctype.name, Some(name) if name.eq_ignore_ascii_case("html"));

    let public = doctype.public_id.as_deref();
    let system = doctype.system_id.as_deref();

    // The small set of legacy doctypes the spec tolerates without a
    // parse error.
    name_ok
        && match (public, system) {
            (None, None) => true,
            (None, Some("about:legacy-compat")) => true,
            (Some("-//W3C//DTD HTML 4.0//EN"), None)
            | (
                Some("-//W3C//DTD HTML 4.0//EN"),
                Some("http://www.w3.org/TR/REC-html40/strict.dtd"),
            ) => true,
            (Some("-//W3C//DTD HTML 4.01//EN"), None)
            | (
                Some("-//W3C//DTD HTML 4.01//EN"),
                Some("http://www.w3.org/TR/html4/strict.dtd"),
            ) => true,
            (
                Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
                Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"),
            ) => true,
            (
                Some("-//W3C//DTD XHTML 1.1//EN"),
                Some("http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd"),
            ) => true,
            _ => false,
        }
}

/// Whether the doctype merits a parse error, and the quirks mode it
/// puts the document into.
pub(crate) fn doctype_error_and_quirks(doctype: &Doctype) -> (bool, QuirksMode) {
    let err = !is_doctype_ok(doctype);

    let name_is_html = matches!(&doctype.name, Some(name) if name.eq_ignore_ascii_case("html"));
    let public = doctype.public_id.as_deref();
    let system = doctype.system_id.as_deref();

    let quirk = if doctype.force_quirks || !name_is_html {
        Quirks
    } else if matches!(public, Some(p) if contains_ignore_ascii_case(QUIRKY_PUBLIC_MATCHES, p)) {
        Quirks
    } else if matches!(system, Some(s) if contains_ignore_ascii_case(QUIRKY_SYSTEM_MATCHES, s)) {
        Quirks
    } else if matches!(public, Some(p) if has_prefix_ignore_ascii_case(QUIRKY_PUBLIC_PREFIXES, p)) {
        Quirks
    } else if matches!(public, Some(p) if has_prefix_ignore_ascii_case(HTML4_PUBLIC_PREFIXES, p))
        && system.is_none()
    {
        Quirks
    } else if matches!(public, Some(p) if has_prefix_ignore_ascii_case(LIMITED_QUIRKY_PUBLIC_PREFIXES, p))
    {
        LimitedQuirks
    } else if matches!(public, Some(p) if has_prefix_ignore_ascii_case(HTML4_PUBLIC_PREFIXES, p))
        && system.is_some()
    {
        LimitedQuirks
    } else {
        NoQuirks
    };

    (err, quirk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril::StrTendril;

    fn doctype(
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Doctype {
        Doctype {
            name: name.map(StrTendril::from_slice),
            public_id: public_id.map(StrTendril::from_slice),
            system_id: system_id.map(StrTendril::from_slice),
            force_quirks: false,
        }
    }

    #[test]
    fn modern_doctype_is_clean() {
        assert_eq!(
            doctype_error_and_quirks(&doctype(Some("html"), None, None)),
            (false, NoQuirks)
        );
        assert_eq!(
            doctype_error_and_quirks(&doctype(Some("HTML"), None, None)),
            (false, NoQuirks)
        );
    }

    #[test]
    fn missing_or_wrong_name_is_quirky() {
        assert_eq!(
            doctype_error_and_quirks(&doctype(None, None, None)),
            (true, Quirks)
        );
        assert_eq!(
            doctype_error_and_quirks(&doctype(Some("xml"), None, None)),
            (true, Quirks)
        );
    }

    #[test]
    fn force_quirks_flag_wins() {
        let mut dt = doctype(Some("html"), None, None);
        dt.force_quirks = true;
        assert_eq!(doctype_error_and_quirks(&dt), (true, Quirks));
    }

    #[test]
    fn legacy_public_ids() {
        // Errors but stays out of full quirks.
        let (err, quirk) = doctype_error_and_quirks(&doctype(
            Some("html"),
            Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
            Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd"),
        ));
        assert!(err);
        assert_eq!(quirk, LimitedQuirks);

        let (err, quirk) = doctype_error_and_quirks(&doctype(
            Some("html"),
            Some("-//W3C//DTD HTML 3.2//EN"),
            None,
        ));
        assert!(err);
        assert_eq!(quirk, Quirks);

        // HTML 4.01 transitional: quirky only without a system id.
        let public = "-//W3C//DTD HTML 4.01 Transitional//EN";
        let (_, quirk) = doctype_error_and_quirks(&doctype(Some("html"), Some(public), None));
        assert_eq!(quirk, Quirks);
        let (_, quirk) = doctype_error_and_quirks(&doctype(
            Some("html"),
            Some(public),
            Some("http://www.w3.org/TR/html4/loose.dtd"),
        ));
        assert_eq!(quirk, LimitedQuirks);
    }
}
