pub use minijinja::{path_loader, Environment, Value};
pub use minijinja_autoreload::AutoReloader;
pub use minijinja_contrib;
pub use minijinja_embed;
use std::sync::Arc;

pub trait ProvidesTemplateEngine {
    fn template_engine(&self) -> &Arc<TemplateEngine>;
}

/// Renders minijinja templates from a per-build source.
///
/// Debug builds watch the template directory and reload on change; release
/// builds render from templates embedded at compile time, so the binary ships
/// without a template directory.
pub struct TemplateEngine {
    source: TemplateSource,
}

enum TemplateSource {
    #[cfg(debug_assertions)]
    Watched(AutoReloader),
    #[cfg(not(debug_assertions))]
    Embedded(Environment<'static>),
}

impl TemplateEngine {
    #[cfg(debug_assertions)]
    pub fn from_reloader(reloader: AutoReloader) -> Self {
        Self {
            source: TemplateSource::Watched(reloader),
        }
    }

    #[cfg(not(debug_assertions))]
    pub fn from_environment(env: Environment<'static>) -> Self {
        Self {
            source: TemplateSource::Embedded(env),
        }
    }

    pub fn render(&self, name: &str, ctx: &Value) -> Result<String, minijinja::Error> {
        match &self.source {
            #[cfg(debug_assertions)]
            TemplateSource::Watched(reloader) => {
                let env = reloader.acquire_env()?;
                env.get_template(name)?.render(ctx)
            }
            #[cfg(not(debug_assertions))]
            TemplateSource::Embedded(env) => env.get_template(name)?.render(ctx),
        }
    }
}

/// Build a [`TemplateEngine`] for the calling crate's template directory.
///
/// Must be invoked from the crate that owns the templates: the debug arm
/// resolves the directory against that crate's manifest, and the release arm
/// loads the templates its build script embedded.
#[macro_export]
macro_rules! create_template_engine {
    ($relative_path:expr) => {{
        #[cfg(debug_assertions)]
        {
            let crate_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            let template_path = crate_dir.join($relative_path);
            let reloader = $crate::utils::template_engine::AutoReloader::new(move |notifier| {
                let mut env = $crate::utils::template_engine::Environment::new();
                env.set_loader($crate::utils::template_engine::path_loader(&template_path));
                notifier.set_fast_reload(true);
                notifier.watch_path(&template_path, true);
                $crate::utils::template_engine::minijinja_contrib::add_to_environment(&mut env);
                Ok(env)
            });
            $crate::utils::template_engine::TemplateEngine::from_reloader(reloader)
        }
        #[cfg(not(debug_assertions))]
        {
            let mut env = $crate::utils::template_engine::Environment::new();
            $crate::utils::template_engine::minijinja_embed::load_templates!(&mut env);
            $crate::utils::template_engine::minijinja_contrib::add_to_environment(&mut env);
            $crate::utils::template_engine::TemplateEngine::from_environment(env)
        }
    }};
}
