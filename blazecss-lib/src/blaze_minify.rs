use crate::context::OptimizeContext;
use crate::error::{MinifyError, Warnings};
use crate::options::Options;
use crate::selectors::{advanced, remove_empty, simple};
use crate::stringifier::Stringifier;
use crate::text::escape_store::{EscapeKind, EscapeStores};
use crate::text::escaper::escape;
use crate::tokenizer::tokenize;

pub mod blaze_css {
    use super::*;

    /// Result of one minify call.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct MinifyOutput {
        pub styles: String,
        pub warnings: Vec<String>,
        /// Fatal problems; `styles` is empty when this is not.
        pub errors: Vec<String>,
    }

    /// Minifies `css`, reporting fatal problems through `errors`.
    pub fn minify(css: &str, options: &Options) -> MinifyOutput {
        into_output(try_minify(css, options))
    }

    pub fn try_minify(css: &str, options: &Options) -> Result<MinifyOutput, MinifyError> {
        check_size(css.len(), options)?;
        let mut stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let escaped = escape(css, &mut stores, &mut warnings);
        run(&escaped, &stores, warnings, options)
    }

    /// Minifies several named stylesheets as one. Warnings point at
    /// `name:line` of the source they come from.
    pub fn minify_sources<N, C>(sources: &[(N, C)], options: &Options) -> MinifyOutput
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        into_output(try_minify_sources(sources, options))
    }

    pub fn try_minify_sources<N, C>(sources: &[(N, C)], options: &Options) -> Result<MinifyOutput, MinifyError>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let total = sources.iter().map(|(_, css)| css.as_ref().len()).sum();
        check_size(total, options)?;

        let mut stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let mut escaped = String::with_capacity(total + sources.len() * 32);
        for (name, css) in sources {
            let marker = stores
                .store_for_mut(EscapeKind::SourceMarker)
                .store(name.as_ref().to_string(), None);
            escaped.push_str(&marker.placeholder());
            escaped.push_str(&escape(css.as_ref(), &mut stores, &mut warnings));
            escaped.push('\n');
        }
        run(&escaped, &stores, warnings, options)
    }

    fn into_output(result: Result<MinifyOutput, MinifyError>) -> MinifyOutput {
        match result {
            Ok(output) => output,
            Err(err) => {
                log::error!("{}", err);
                MinifyOutput {
                    errors: vec![err.to_string()],
                    ..MinifyOutput::default()
                }
            }
        }
    }

    fn check_size(size: usize, options: &Options) -> Result<(), MinifyError> {
        let limit = options.limits.max_input_bytes;
        if size > limit {
            return Err(MinifyError::InputTooLarge { size, limit });
        }
        Ok(())
    }

    fn run(
        escaped: &str,
        stores: &EscapeStores,
        mut warnings: Warnings,
        options: &Options,
    ) -> Result<MinifyOutput, MinifyError> {
        let profile = options.compatibility.resolve()?;
        let mut tokens = tokenize(escaped, stores, &mut warnings, &options.limits)?;

        let context = OptimizeContext::new(options, &profile);
        simple::optimize(&mut tokens, &context);
        if options.advanced {
            advanced::optimize(&mut tokens, &context);
        }
        remove_empty(&mut tokens);

        let styles = Stringifier::new(stores, options, &profile).stringify(&tokens);
        log::debug!("minified {} bytes into {}", escaped.len(), styles.len());
        Ok(MinifyOutput {
            styles,
            warnings: warnings.into_vec(),
            errors: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::blaze_css::*;
    use crate::options::{Compatibility, Limits, Options};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minify_basic() {
        let output = minify("a { color : #ff0000 ; margin : 0px 0px }", &Options::default());
        assert_eq!(output.styles, "a{color:red;margin:0}");
        assert!(output.warnings.is_empty());
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_input_too_large() {
        let options = Options {
            limits: Limits {
                max_input_bytes: 4,
                ..Limits::default()
            },
            ..Options::default()
        };
        let output = minify("a{color:red}", &options);
        assert_eq!(output.styles, "");
        assert_eq!(output.errors, vec!["input of 12 bytes exceeds the 4 byte limit"]);
        assert!(try_minify("a{color:red}", &options).is_err());
    }

    #[test]
    fn test_invalid_compatibility() {
        let options = Options {
            compatibility: Compatibility::Preset("ie8,+bogus.flag".to_string()),
            ..Options::default()
        };
        let output = minify("a{color:red}", &options);
        assert_eq!(output.errors.len(), 1);
        assert!(output.styles.is_empty());
    }

    #[test]
    fn test_sources_carry_names() {
        let sources = [("one.css", "a{color:red}"), ("two.css", "}b{color:blue}")];
        let output = minify_sources(&sources, &Options::default());
        assert_eq!(output.styles, "a{color:red}b{color:blue}");
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("two.css:1"), "{:?}", output.warnings);
    }

    #[test]
    fn test_simple_mode_only() {
        let options = Options {
            advanced: false,
            ..Options::default()
        };
        assert_eq!(minify("a{color:red}a{color:blue}", &options).styles, "a{color:red}a{color:blue}");
        assert_eq!(minify("a{color:red}a{color:blue}", &Options::default()).styles, "a{color:blue}");
    }
}
