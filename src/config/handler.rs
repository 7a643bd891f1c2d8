//! Config handler: default seeding, discovery and the load/merge/import pipeline
//!
//! Load order for a handler:
//! 1. Built-in defaults
//! 2. Explicit file if it exists, else the first `conf.*` in the config directory
//! 3. Every yaml/json/toml file in the search directory (auto-search only)
//!
//! Each file is merged on top of what is already loaded, then its `import`
//! list is followed depth-first. Problems with a single file never abort the
//! load: they are logged and kept as [`Diagnostic`]s.

use super::defaults::{default_mapping, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_GLOB};
use super::error::{ConfigError, Result};
use super::format::{read_config_file, ConfigFormat};
use super::imports::{resolve_imports, ImportStep, SkippedImport};
use super::namespace::{Entry, Namespace};
use globset::Glob;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file-level problem that was swallowed during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: &'static str,
    pub path: PathBuf,
    pub message: String,
}

/// Options for building a [`ConfigHandler`].
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    file_path: Option<PathBuf>,
    auto_search: bool,
    config_dir: PathBuf,
    search_dir: Option<PathBuf>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            file_path: None,
            auto_search: false,
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            search_dir: None,
        }
    }
}

impl HandlerOptions {
    /// Explicit config file, tried before `conf.*` discovery.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Also load every supported file from the search directory.
    pub fn auto_search(mut self, enabled: bool) -> Self {
        self.auto_search = enabled;
        self
    }

    /// Directory searched for `conf.*` (default `data/config/`).
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Directory scanned by auto-search (default: current working directory).
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> ConfigHandler {
        let mut handler = ConfigHandler::defaults_only();

        let explicit = self.file_path.as_deref().filter(|p| !p.as_os_str().is_empty());
        match explicit {
            Some(path) if path.exists() => handler.load_config_file(path),
            _ => {
                if let Some(path) = explicit {
                    handler.report(
                        path,
                        "not_found",
                        "explicit config file does not exist, falling back to discovery"
                            .to_string(),
                    );
                }
                match discover_default_file(&self.config_dir) {
                    Some(found) => handler.load_config_file(&found),
                    None => debug!(
                        "No {} found in {}, using defaults",
                        DEFAULT_CONFIG_GLOB,
                        self.config_dir.display()
                    ),
                }
            }
        }

        if self.auto_search {
            let search_dir = match self.search_dir {
                Some(dir) => Some(dir),
                None => std::env::current_dir().ok(),
            };
            match search_dir {
                Some(dir) => handler.search_and_load_files(&dir),
                None => warn!("Cannot determine current directory for config auto-search"),
            }
        }

        handler
    }
}

/// Merged configuration with typed read access.
#[derive(Debug, Clone)]
pub struct ConfigHandler {
    namespace: Namespace,
    diagnostics: Vec<Diagnostic>,
    loaded_files: Vec<PathBuf>,
    // Files currently being loaded, outermost first.
    import_chain: Vec<PathBuf>,
}

impl ConfigHandler {
    /// Load defaults, then `file_path` or the default `conf.*`, then optionally
    /// every config file in the current directory.
    pub fn new(file_path: Option<&Path>, auto_search: bool) -> Self {
        let mut options = HandlerOptions::default().auto_search(auto_search);
        if let Some(path) = file_path {
            options = options.file_path(path);
        }
        options.build()
    }

    pub fn builder() -> HandlerOptions {
        HandlerOptions::default()
    }

    /// A handler holding only the built-in defaults; no discovery is done.
    pub fn defaults_only() -> Self {
        let mut namespace = Namespace::new();
        if let Err(err) = namespace.merge(&default_mapping()) {
            warn!("Built-in defaults rejected: {}", err);
        }
        Self {
            namespace,
            diagnostics: Vec::new(),
            loaded_files: Vec::new(),
            import_chain: Vec::new(),
        }
    }

    /// Load another file on top of the current state.
    ///
    /// Returns `false` (and changes nothing) when the path does not exist.
    /// An existing file that then fails to load still returns `true`; the
    /// failure is available from [`ConfigHandler::diagnostics`].
    pub fn add_config_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.exists() {
            self.report(path, "not_found", "the file does not exist".to_string());
            return false;
        }
        self.load_config_file(path);
        true
    }

    /// Read a key; keys that were never set fail with `AttributeNotFound`.
    pub fn get(&self, name: &str) -> Result<&Entry> {
        self.namespace.require(name)
    }

    pub fn require(&self, name: &str) -> Result<&Entry> {
        self.namespace.require(name)
    }

    /// Leaf value at a dotted path.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.namespace.value(path)
    }

    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.namespace.get_as(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.namespace.contains(path)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn into_namespace(self) -> Namespace {
        self.namespace
    }

    /// Swallowed per-file problems, in the order they happened.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Files merged successfully, in load order (imports included).
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    fn search_and_load_files(&mut self, search_dir: &Path) {
        let entries = match fs::read_dir(search_dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.report(search_dir, "io", format!("cannot list directory: {err}"));
                return;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && ConfigFormat::from_path(path).is_some())
            .collect();
        files.sort();

        if files.is_empty() {
            debug!("No configuration files found in {}", search_dir.display());
            return;
        }

        for file in files {
            self.load_config_file(&file);
        }
    }

    /// Load one file, swallowing any error at this file's boundary.
    fn load_config_file(&mut self, path: &Path) {
        if let Err(err) = self.try_load(path) {
            self.report(path, err.kind(), err.to_string());
        }
    }

    fn try_load(&mut self, path: &Path) -> Result<()> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.import_chain.contains(&key) {
            let chain = self
                .import_chain
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ConfigError::CyclicImport { path: path.to_path_buf(), chain });
        }

        let mapping = read_config_file(path)?;
        self.namespace.merge(&mapping)?;
        self.loaded_files.push(path.to_path_buf());
        debug!("Loaded config file {}", path.display());

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.import_chain.push(key);
        resolve_imports(&mapping, &base_dir, |step| match step {
            ImportStep::Load(target) => self.load_config_file(&target),
            ImportStep::Skip(skipped) => {
                let kind = match skipped {
                    SkippedImport::Missing { .. } => "import_missing",
                    _ => "import_invalid",
                };
                let target = match &skipped {
                    SkippedImport::Missing { path, .. } => path.clone(),
                    _ => path.to_path_buf(),
                };
                self.report(&target, kind, skipped.to_string());
            }
        });
        self.import_chain.pop();

        Ok(())
    }

    fn report(&mut self, path: &Path, kind: &'static str, message: String) {
        warn!("Config {} ({}): {}", path.display(), kind, message);
        self.diagnostics.push(Diagnostic { kind, path: path.to_path_buf(), message });
    }
}

impl Deref for ConfigHandler {
    type Target = Namespace;

    fn deref(&self) -> &Namespace {
        &self.namespace
    }
}

impl Default for ConfigHandler {
    fn default() -> Self {
        Self::defaults_only()
    }
}

/// First file (by name) in `config_dir` matching [`DEFAULT_CONFIG_GLOB`].
pub fn discover_default_file(config_dir: &Path) -> Option<PathBuf> {
    let matcher = Glob::new(DEFAULT_CONFIG_GLOB).ok()?.compile_matcher();
    let mut candidates: Vec<PathBuf> = fs::read_dir(config_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.file_name().map(|name| matcher.is_match(name)).unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const YAML_CONF: &str = "appname: MyApp\nversion: 1.0\ndebug: false\ndatabase:\n  host: localhost\n  port: 5430\n";
    const JSON_CONF: &str = r#"{"appname": "MyApp", "version": 1.1, "debug": false, "database": {"host": "localhost", "port": 5431}}"#;
    const TOML_CONF: &str = "appname = \"MyApp\"\nversion = 1.2\ndebug = false\n\n[database]\nhost = \"localhost\"\nport = 5432\n";

    fn handler_for(tmp: &TempDir) -> HandlerOptions {
        ConfigHandler::builder().config_dir(tmp.path().join("no-config-dir"))
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, content).expect("write");
        path
    }

    fn kinds(handler: &ConfigHandler) -> Vec<&'static str> {
        handler.diagnostics().iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_defaults_when_nothing_discoverable() {
        let tmp = TempDir::new().expect("tmp");
        let handler = handler_for(&tmp).build();

        assert_eq!(handler.value("pluginDir"), Some(&json!("plugins/")));
        assert_eq!(handler.value("appname"), Some(&json!("ApplicationByReWi")));
        assert_eq!(handler.value("datasRecorderTime"), Some(&json!(1000)));
        assert!(handler.loaded_files().is_empty());
        assert!(handler.diagnostics().is_empty());
    }

    #[test]
    fn test_load_each_format() {
        let tmp = TempDir::new().expect("tmp");
        let cases = [
            ("conf.yaml", YAML_CONF, 1.0, 5430),
            ("conf.json", JSON_CONF, 1.1, 5431),
            ("conf.toml", TOML_CONF, 1.2, 5432),
        ];

        for (name, content, version, port) in cases {
            let path = write(tmp.path(), name, content);
            let handler = handler_for(&tmp).file_path(&path).build();

            assert_eq!(handler.value("appname"), Some(&json!("MyApp")), "{name}");
            assert_eq!(handler.get_as::<f64>("version").unwrap(), version, "{name}");
            assert_eq!(handler.value("debug"), Some(&json!(false)), "{name}");
            assert_eq!(handler.value("database.host"), Some(&json!("localhost")), "{name}");
            assert_eq!(handler.get_as::<u16>("database.port").unwrap(), port, "{name}");
            // Untouched defaults survive the merge.
            assert_eq!(handler.value("datasRecorderTime"), Some(&json!(1000)), "{name}");
        }
    }

    #[test]
    fn test_discovers_conf_glob_in_config_dir() {
        let tmp = TempDir::new().expect("tmp");
        let config_dir = tmp.path().join("data/config");
        write(&config_dir, "conf.json", JSON_CONF);
        write(&config_dir, "other.yaml", "appname: Other\n");

        let handler = ConfigHandler::builder().config_dir(&config_dir).build();
        assert_eq!(handler.get_as::<u16>("database.port").unwrap(), 5431);
        assert_eq!(handler.loaded_files(), &[config_dir.join("conf.json")]);
    }

    #[test]
    fn test_explicit_path_beats_discovery() {
        let tmp = TempDir::new().expect("tmp");
        let config_dir = tmp.path().join("cfg");
        write(&config_dir, "conf.json", JSON_CONF);
        let explicit = write(tmp.path(), "explicit.toml", TOML_CONF);

        let handler = ConfigHandler::builder().config_dir(&config_dir).file_path(&explicit).build();
        assert_eq!(handler.get_as::<u16>("database.port").unwrap(), 5432);
        assert_eq!(handler.loaded_files().len(), 1);
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_discovery() {
        let tmp = TempDir::new().expect("tmp");
        let config_dir = tmp.path().join("cfg");
        write(&config_dir, "conf.yaml", YAML_CONF);

        let handler = ConfigHandler::builder()
            .config_dir(&config_dir)
            .file_path(tmp.path().join("nope.toml"))
            .build();
        assert_eq!(handler.get_as::<u16>("database.port").unwrap(), 5430);
        assert_eq!(kinds(&handler), vec!["not_found"]);
    }

    #[test]
    fn test_missing_import_is_skipped_with_diagnostic() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), "a.yaml", "from_a: 1\n");
        let main = write(
            tmp.path(),
            "main.yaml",
            "name: main\nimport:\n  - a.yaml\n  - missing.yaml\n",
        );

        let handler = handler_for(&tmp).file_path(&main).build();

        assert_eq!(handler.value("from_a"), Some(&json!(1)));
        assert_eq!(handler.value("name"), Some(&json!("main")));
        assert_eq!(kinds(&handler), vec!["import_missing"]);
        assert!(handler.diagnostics()[0].message.contains("missing.yaml"));
        // The raw import list is kept as ordinary data.
        assert_eq!(handler.value("import"), Some(&json!(["a.yaml", "missing.yaml"])));
    }

    #[test]
    fn test_imports_resolve_relative_to_importing_file_depth_first() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), "nested/a.toml", "shared = \"a\"\nfrom_a = \"a\"\nimport = [\"c.json\"]\n");
        write(tmp.path(), "nested/c.json", r#"{"from_a": "c", "shared": "c"}"#);
        write(tmp.path(), "b.yaml", "shared: b\n");
        let main = write(
            tmp.path(),
            "main.json",
            r#"{"shared": "main", "import": ["nested/a.toml", "b.yaml"]}"#,
        );

        let handler = handler_for(&tmp).file_path(&main).build();

        // main -> a -> c -> b
        assert_eq!(handler.value("shared"), Some(&json!("b")));
        assert_eq!(handler.value("from_a"), Some(&json!("c")));
        let names: Vec<String> = handler
            .loaded_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["main.json", "a.toml", "c.json", "b.yaml"]);
        assert!(handler.diagnostics().is_empty());
    }

    #[test]
    fn test_imported_nested_mappings_deep_merge() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), "db.yaml", "database:\n  port: 7000\n");
        let main = write(
            tmp.path(),
            "main.yaml",
            "database:\n  host: localhost\n  port: 5430\nimport: [db.yaml]\n",
        );

        let handler = handler_for(&tmp).file_path(&main).build();
        assert_eq!(handler.value("database.host"), Some(&json!("localhost")));
        assert_eq!(handler.value("database.port"), Some(&json!(7000)));
    }

    #[test]
    fn test_cyclic_import_is_reported_not_followed() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), "a.yaml", "a: 1\nimport: [b.yaml]\n");
        write(tmp.path(), "b.yaml", "b: 2\nimport: [a.yaml]\n");

        let handler = handler_for(&tmp).file_path(tmp.path().join("a.yaml")).build();

        assert_eq!(handler.value("a"), Some(&json!(1)));
        assert_eq!(handler.value("b"), Some(&json!(2)));
        assert_eq!(kinds(&handler), vec!["cyclic_import"]);
        assert_eq!(handler.loaded_files().len(), 2);
    }

    #[test]
    fn test_self_import_is_cyclic() {
        let tmp = TempDir::new().expect("tmp");
        let path = write(tmp.path(), "self.json", r#"{"x": 1, "import": ["self.json"]}"#);

        let handler = handler_for(&tmp).file_path(&path).build();
        assert_eq!(handler.value("x"), Some(&json!(1)));
        assert_eq!(kinds(&handler), vec!["cyclic_import"]);
    }

    #[test]
    fn test_diamond_import_is_not_a_cycle() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), "shared.yaml", "shared: true\n");
        write(tmp.path(), "left.yaml", "import: [shared.yaml]\n");
        write(tmp.path(), "right.yaml", "import: [shared.yaml]\n");
        let main = write(tmp.path(), "main.yaml", "import: [left.yaml, right.yaml]\n");

        let handler = handler_for(&tmp).file_path(&main).build();
        assert!(handler.diagnostics().is_empty());
        assert_eq!(handler.loaded_files().len(), 5);
    }

    #[test]
    fn test_add_config_file_missing_returns_false() {
        let tmp = TempDir::new().expect("tmp");
        let mut handler = handler_for(&tmp).build();
        let before = handler.namespace().clone();

        assert!(!handler.add_config_file(tmp.path().join("missing.yaml")));
        assert_eq!(handler.namespace(), &before);
        assert_eq!(kinds(&handler), vec!["not_found"]);
    }

    #[test]
    fn test_add_config_file_merges_on_top() {
        let tmp = TempDir::new().expect("tmp");
        let base = write(tmp.path(), "base.yaml", YAML_CONF);
        let extra = write(tmp.path(), "extra.json", r#"{"database": {"user": "admin"}}"#);

        let mut handler = handler_for(&tmp).file_path(&base).build();
        assert!(handler.add_config_file(&extra));

        assert_eq!(handler.value("database.user"), Some(&json!("admin")));
        assert_eq!(handler.value("database.port"), Some(&json!(5430)));
    }

    #[test]
    fn test_malformed_file_contributes_nothing() {
        let tmp = TempDir::new().expect("tmp");
        let bad = write(tmp.path(), "bad.toml", "this is = = not toml");
        let mut handler = handler_for(&tmp).build();
        let before = handler.namespace().clone();

        assert!(handler.add_config_file(&bad));
        assert_eq!(handler.namespace(), &before);
        assert_eq!(kinds(&handler), vec!["parse"]);
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let tmp = TempDir::new().expect("tmp");
        let ini = write(tmp.path(), "conf.ini", "a=1\n");
        let mut handler = handler_for(&tmp).build();

        assert!(handler.add_config_file(&ini));
        assert_eq!(kinds(&handler), vec!["unsupported_format"]);
    }

    #[test]
    fn test_invalid_key_file_is_rejected_whole() {
        let tmp = TempDir::new().expect("tmp");
        let path = write(tmp.path(), "keys.json", r#"{"good": 1, "bad.key": 2}"#);
        let mut handler = handler_for(&tmp).build();

        assert!(handler.add_config_file(&path));
        assert!(!handler.contains("good"));
        assert_eq!(kinds(&handler), vec!["invalid_key"]);
    }

    #[test]
    fn test_auto_search_loads_supported_files_in_name_order() {
        let tmp = TempDir::new().expect("tmp");
        let search = tmp.path().join("cwd");
        write(&search, "a.json", r#"{"k": 1, "only_a": true}"#);
        write(&search, "b.yaml", "k: 2\n");
        write(&search, "notes.txt", "k: 3\n");

        let handler = handler_for(&tmp).auto_search(true).search_dir(&search).build();

        assert_eq!(handler.value("k"), Some(&json!(2)));
        assert_eq!(handler.value("only_a"), Some(&json!(true)));
        assert_eq!(handler.loaded_files().len(), 2);
    }

    #[test]
    fn test_unset_attribute_fails() {
        let tmp = TempDir::new().expect("tmp");
        let handler = handler_for(&tmp).build();
        let err = handler.get("neverSet").unwrap_err();
        assert!(matches!(err, ConfigError::AttributeNotFound(ref name) if name == "neverSet"));
        assert!(handler.require("pluginDir").is_ok());
        // Namespace methods are reachable through deref.
        assert!(handler.keys().any(|key| key == "moduleDir"));
    }

    #[test]
    fn test_handlers_do_not_share_state() {
        let tmp = TempDir::new().expect("tmp");
        let extra = write(tmp.path(), "extra.yaml", "only_first: yes\n");

        let mut first = handler_for(&tmp).build();
        first.add_config_file(&extra);
        let second = handler_for(&tmp).build();

        assert!(first.contains("only_first"));
        assert!(!second.contains("only_first"));
    }
}
