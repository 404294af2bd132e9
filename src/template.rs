// Copyright (C) 2026 by GiGa infosystems

//! Render the machine readable documents using minijinja templates, see [`Templates`]

use crate::config::OutputOptions;
use color_eyre::{Result, eyre::bail};
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_XML: &str = r#"<?xml version="1.0"?>
<modules>
{%- for module in modules %}
  <module name="{{ module.name|xml }}" installed="{{ module.installed|xml }}" latest="{{ module.latest|xml }}" missedMajors="{{ module.missedMajors }}" missedMinors="{{ module.missedMinors }}" missedPatches="{{ module.missedPatches }}" status="{{ module.status }}"><versions>{{ module.versions|join(",")|xml }}</versions></module>
{%- endfor %}
</modules>
"#;

/// Escape the characters that are not allowed verbatim in XML text & attribute values
fn xml_escape(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// The templates for the XML & JSON documents.
///
/// Each document is rendered from, in order of priority:
/// * the inline template source from the [`OutputOptions`],
/// * the template file ([`Templates::XML`] or [`Templates::JSON`]) in the template directory,
/// * the built-in default: an XML document with one `<module>` element per module, or the
///   prettified JSON dump of the context.
///
/// The context of both templates is `{"modules": [...]}`, where every module has the keys `name`,
/// `installed`, `latest`, `missedMajors`, `missedMinors`, `missedPatches`, `versions` (a list of
/// strings) and `status` (`success` or `fail`). Values are not escaped automatically, the `xml`
/// filter escapes a value for XML.
pub struct Templates {
    jinja: Environment<'static>,
}

impl Templates {
    pub const XML: &str = "report.xml.jinja";
    pub const JSON: &str = "report.json.jinja";

    pub fn init(template_dir: Option<PathBuf>, output: &OutputOptions) -> Result<Self> {
        let mut jinja = Environment::new();
        // Escaping is only done explicitly, using the `xml` filter
        jinja.set_auto_escape_callback(|_| AutoEscape::None);
        jinja.add_filter("xml", xml_escape);

        let template_dir = match template_dir {
            Some(dir) if !dir.is_dir() => bail!("Template directory {dir:?} doesn't exist"),
            Some(dir) => {
                jinja.set_loader(minijinja::path_loader(&dir));
                Some(dir)
            }
            None => None,
        };

        let has_file =
            |name: &str| template_dir.as_ref().is_some_and(|dir| dir.join(name).is_file());

        if let Some(ref source) = output.xml_template {
            jinja.add_template_owned(Self::XML, source.clone())?;
        } else if has_file(Self::XML) {
            // Report syntax errors early
            jinja.get_template(Self::XML)?;
        } else {
            jinja.add_template(Self::XML, DEFAULT_XML)?;
        }

        if let Some(ref source) = output.json_template {
            jinja.add_template_owned(Self::JSON, source.clone())?;
        } else if has_file(Self::JSON) {
            jinja.get_template(Self::JSON)?;
        }

        Ok(Templates { jinja })
    }

    fn render(&self, name: &str, ctx: &impl Serialize) -> Result<Option<String>> {
        let template = match self.jinja.get_template(name) {
            Ok(template) => template,
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(template.render(ctx)?))
    }

    pub fn render_xml(&self, ctx: &impl Serialize) -> Result<String> {
        match self.render(Self::XML, ctx)? {
            Some(out) => Ok(out),
            None => bail!("Missing the `{}` template", Self::XML),
        }
    }

    pub fn render_json(&self, ctx: &impl Serialize) -> Result<String> {
        match self.render(Self::JSON, ctx)? {
            Some(out) => Ok(out),
            None => Ok(serde_json::to_string_pretty(ctx)?),
        }
    }
}
