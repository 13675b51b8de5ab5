use blazecss_lib::{minify, Compatibility, Limits, Options};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};

#[cfg(test)]
pub mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minified(css: &str) -> String {
        let _ = env_logger::builder().is_test(true).try_init();
        let output = minify(css, &Options::default());
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        output.styles
    }

    fn assert_reparses(styles: &str) {
        if let Err(e) = StyleSheet::parse(styles, ParserOptions::default()) {
            panic!("`{}` does not re-parse: {}", styles, e);
        }
    }

    const STYLESHEETS: &[&str] = &[
        "a{color:red} b{color:red} a{color:red}",
        ".a{margin:0;margin-top:1px}",
        "@media screen{a{margin:0}}@media screen{b{padding:0}}",
        "div > p { color: #ff0000; background: url(\"a.png\") no-repeat }",
        ".a{display:block}.b{float:left}",
        "@font-face{font-family:\"Open Sans\";src:url(a.woff)}a{font-family:\"Open Sans\",serif}",
        "@keyframes spin{from{opacity:0}100%{opacity:1}}",
        "a{color:var(--white);background:var(--bg-black) url(a.png)}",
        "a{width:0.001px;margin:-0.004px 1.23456px}",
        "a{background:url(a.png),url(b.png);background-repeat:no-repeat}",
        "a{width:10px;width:fit-content}",
    ];

    /// Legacy or odd input that is not expected to re-parse cleanly.
    const LEGACY_STYLESHEETS: &[&str] = &[
        "a{width:__ESCAPED_URL_0(0)__}",
        "a{color:red\\9}a{color:blue}",
        "a{color:blue}a{color:red\\9}",
        "a{_width:1px;width:2px}",
    ];

    #[test]
    fn test_idempotent() {
        for css in STYLESHEETS.iter().chain(LEGACY_STYLESHEETS) {
            let once = minified(css);
            assert_eq!(minified(&once), once, "input: {}", css);
        }
    }

    #[test]
    fn test_output_reparses() {
        for css in STYLESHEETS {
            assert_reparses(&minified(css));
        }
    }

    #[test]
    fn test_pass_through() {
        assert_eq!(minified(".a { display: block }\n.b { float: left }"), ".a{display:block}.b{float:left}");
    }

    #[test]
    fn test_shorthand_algebra() {
        assert_eq!(minified("a{color:#ff0000;color:#f00;}"), "a{color:red}");
        assert_eq!(minified("a{margin:1px 1px 1px 1px}"), "a{margin:1px}");
        assert_eq!(minified("a{margin:0;margin-top:1px}"), "a{margin:1px 0 0}");
    }

    #[test]
    fn test_override_safety() {
        assert_eq!(minified("a{color:red!important;} a{color:blue;}"), "a{color:red!important}");
    }

    #[test]
    fn test_reorder_safety() {
        assert_eq!(minified("a{color:red} b{color:red} a{color:red}"), "a,b{color:red}");
        assert_eq!(
            minified(".a{color:red}.b{color:blue}.a{display:block}"),
            ".a{color:red;display:block}.b{color:blue}"
        );
    }

    #[test]
    fn test_escaping_round_trip() {
        assert_eq!(
            minified("a{background:url(\"a b.png\");content:\"x y\"}/* note */"),
            "a{background:url(\"a b.png\");content:\"x y\"}"
        );
    }

    #[test]
    fn test_duplicate_rules_collapse() {
        assert_eq!(minified("a{color:red} a{color:red}"), "a{color:red}");
    }

    #[test]
    fn test_media_merge() {
        assert_eq!(
            minified("@media screen{a{color:red}}@media screen{b{display:block}}"),
            "@media screen{a{color:red}b{display:block}}"
        );
    }

    #[test]
    fn test_keyframes() {
        assert_eq!(
            minified("@keyframes spin{from{opacity:0}100%{opacity:1}}"),
            "@keyframes spin{0%{opacity:0}to{opacity:1}}"
        );
    }

    #[test]
    fn test_variables_keep_their_names() {
        assert_eq!(minified("a{color:var(--white)}"), "a{color:var(--white)}");
        assert_eq!(
            minified("a{background:var(--bg-black) url(a.png)}"),
            "a{background:var(--bg-black) url(a.png)}"
        );
    }

    #[test]
    fn test_px_rounding() {
        assert_eq!(minified("a{width:0.001px}"), "a{width:0}");
        assert_eq!(minified("a{width:1.23456px}"), "a{width:1.23px}");

        let options = Options {
            rounding_precision: 0,
            ..Options::default()
        };
        assert_eq!(minify("a{width:1.6px;height:0.4px}", &options).styles, "a{width:2px;height:0}");

        let options = Options {
            rounding_precision: 4,
            ..Options::default()
        };
        assert_eq!(minify("a{width:1.23456px;top:1.5em}", &options).styles, "a{width:1.2346px;top:1.5em}");
    }

    #[test]
    fn test_longhand_fills_every_background_layer() {
        assert_eq!(
            minified("a{background:url(a.png),url(b.png);background-repeat:no-repeat}"),
            "a{background:url(a.png) no-repeat,url(b.png) no-repeat}"
        );
    }

    #[test]
    fn test_placeholder_lookalike_survives() {
        let once = minified("a{width:__ESCAPED_URL_0(0)__}");
        assert_eq!(once, "a{width:__ESCAPED_URL_0(0)__}");
        assert_eq!(minified(&once), once);
    }

    #[test]
    fn test_hacks_overridden_by_plain_values() {
        assert_eq!(minified("a{color:red\\9}a{color:blue}"), "a{color:blue}");
        assert_eq!(minified("a{color:blue}a{color:red\\9}"), "a{color:blue;color:red\\9}");

        let ie7 = Options {
            compatibility: Compatibility::Preset("ie7".to_string()),
            ..Options::default()
        };
        assert_eq!(minify("a{color:red !ie}a{color:blue}", &ie7).styles, "a{color:blue}");
        assert_eq!(minify("a{color:blue}a{color:red !ie}", &ie7).styles, "a{color:blue;color:red !ie}");
    }

    #[test]
    fn test_keyword_fallback_kept() {
        assert_eq!(minified("a{width:10px;color:red;width:fit-content}"), "a{width:10px;color:red;width:fit-content}");
    }

    #[test]
    fn test_warnings_are_not_fatal() {
        let output = minify("}a{color:red}", &Options::default());
        assert_eq!(output.styles, "a{color:red}");
        assert_eq!(output.warnings.len(), 1);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_nesting_limit() {
        let options = Options {
            limits: Limits {
                max_nesting_depth: 2,
                ..Limits::default()
            },
            ..Options::default()
        };
        let output = minify("@media a{@media b{@media c{a{color:red}}}}", &options);
        assert_eq!(output.styles, "");
        assert_eq!(output.errors.len(), 1);
    }

    #[test]
    fn test_ie7_hacks_follow_profile() {
        assert_eq!(minified("*+html .a{color:red}"), "");
        let options = Options {
            compatibility: Compatibility::Preset("ie7".to_string()),
            ..Options::default()
        };
        assert_eq!(minify("*+html .a{color:red}", &options).styles, "*+html .a{color:red}");
    }
}
