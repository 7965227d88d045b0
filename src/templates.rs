//! Template Engine - Named Templates With `{{key}}` Substitution
//!
//! Every artifact kind has a built-in default template; an explicit
//! registration under the same name shadows the default. Rendering an
//! unknown name with no default is a `TemplateNotFound` failure.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::pipeline::GeneratorError;

const DEFAULT_PDSC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package schemaVersion="1.7.7" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <vendor>{{vendor}}</vendor>
  <name>{{name}}</name>
  <description>{{description}}</description>
  <url>https://www.st.com/en/embedded-software/</url>
  <releases>
    <release version="{{version}}">{{release_note}}</release>
  </releases>
  <keywords>
{{keywords}}  </keywords>
  <components>
{{components}}  </components>
</package>
"#;

const DEFAULT_TX_USER: &str = r#"/* tx_user.h - ThreadX user configuration for {{family}} */

#ifndef TX_USER_H
#define TX_USER_H

/* Azure RTOS ThreadX {{version}} */

#define TX_THREAD_MAX_COUNT              {{max_threads}}
#define TX_THREAD_STACK_SIZE_DEFAULT     {{stack_size}}
#define TX_MINIMUM_STACK                 {{minimum_stack}}
#define TX_MAX_PRIORITIES                32
#define TX_THREAD_PREEMPT_THRESHOLD      {{preemption_threshold}}
#define TX_TIMER_TICKS_PER_SECOND        {{ticks_per_second}}
#define TX_TIMER_THREAD_PRIORITY         0
{{feature_defines}}{{debug_defines}}
#endif /* TX_USER_H */
"#;

const DEFAULT_FX_USER: &str = r#"/* fx_user.h - FileX user configuration */

#ifndef FX_USER_H
#define FX_USER_H

/* Azure RTOS FileX {{version}} */

#define FX_MAX_LONG_NAME_LEN             256
#define FX_MAX_LAST_NAME_LEN             256
#define FX_MAX_SECTOR_CACHE              256
#define FX_FAT_MAP_SIZE                  128
#define FX_MAX_FAT_CACHE                 16
#define FX_UPDATE_RATE_IN_SECONDS        10

#endif /* FX_USER_H */
"#;

const DEFAULT_NX_USER: &str = r#"/* nx_user.h - NetX Duo user configuration */

#ifndef NX_USER_H
#define NX_USER_H

/* Azure RTOS NetX Duo {{version}} */

#define NX_TCP_ENABLE
#define NX_UDP_ENABLE
#define NX_PACKET_SIZE                   1536
#define NX_PACKET_POOL_SIZE              (16 * 1536)
#define NX_TCP_MAXIMUM_CONNECTIONS       8
#define NX_ARP_CACHE_SIZE                520

#endif /* NX_USER_H */
"#;

const DEFAULT_UX_USER: &str = r#"/* ux_user.h - USBX user configuration */

#ifndef UX_USER_H
#define UX_USER_H

/* Azure RTOS USBX {{version}} */

#define UX_MAX_CLASS_DRIVER              3
#define UX_MAX_SLAVE_CLASS_DRIVER        3
#define UX_MAX_HCD                       2
#define UX_MAX_DEVICES                   8
#define UX_THREAD_STACK_SIZE             2048

#endif /* UX_USER_H */
"#;

const DEFAULT_GX_USER: &str = r#"/* gx_user.h - GUIX user configuration */

#ifndef GX_USER_H
#define GX_USER_H

/* Azure RTOS GUIX {{version}} */

#define GX_SYSTEM_TIMER_MS               20
#define GX_MAX_VIEWS                     8
#define GX_MAX_QUEUE_EVENTS              48
#define GX_CANVAS_REFRESH_RATE           60

#endif /* GX_USER_H */
"#;

const DEFAULT_README: &str = r#"# {{package_name}}

Azure RTOS software expansion package for the {{family}} family.

- Azure RTOS version: {{version}}
- Target cores: {{cores}}

## Supported boards

{{boards}}
## Supported toolchains

{{toolchains}}
## Reference applications

{{applications}}"#;

/// Named-template registry with token substitution.
#[derive(Debug)]
pub struct TemplateEngine {
    templates: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Register (or shadow) a template under a name.
    pub fn register_template(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.templates.insert(name.into(), content.into());
    }

    /// Explicitly registered template content, ignoring defaults.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Register every readable file in `dir` under its stem. Files failing
    /// the structural check are skipped, not fatal. Returns the number of
    /// templates loaded.
    pub fn load_from_dir(&mut self, dir: &Path) -> Result<usize, std::io::Error> {
        let mut loaded = 0;
        if !dir.exists() {
            return Ok(0);
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(content) if validate_template(&content) => {
                    self.register_template(stem, content);
                    loaded += 1;
                }
                Ok(_) => {
                    warn!(template = stem, "skipping template with unbalanced markers");
                }
                Err(e) => {
                    warn!(template = stem, error = %e, "skipping unreadable template");
                }
            }
        }
        Ok(loaded)
    }

    /// Substitute every `{{key}}` occurrence for each provided variable.
    /// Falls back to the built-in default when nothing is registered under
    /// `name`.
    pub fn render(&self, name: &str, variables: &[(&str, String)]) -> Result<String, GeneratorError> {
        let template = self
            .get(name)
            .or_else(|| default_template(name))
            .ok_or_else(|| GeneratorError::TemplateNotFound(name.to_string()))?;

        let mut content = template.to_string();
        for (key, value) in variables {
            content = content.replace(&format!("{{{{{key}}}}}"), value);
        }
        Ok(content)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn default_template(name: &str) -> Option<&'static str> {
    match name {
        "pdsc" => Some(DEFAULT_PDSC),
        "tx_user" => Some(DEFAULT_TX_USER),
        "fx_user" => Some(DEFAULT_FX_USER),
        "nx_user" => Some(DEFAULT_NX_USER),
        "ux_user" => Some(DEFAULT_UX_USER),
        "gx_user" => Some(DEFAULT_GX_USER),
        "readme" => Some(DEFAULT_README),
        _ => None,
    }
}

/// Shallow structural check: open and close marker counts must match. Not
/// a parse, and does not verify that referenced variables exist.
pub fn validate_template(content: &str) -> bool {
    content.matches("{{").count() == content.matches("}}").count()
}
