//! Loading connection profiles from the config file and the environment.

use std::{
    collections::BTreeMap,
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The domain that bare project identifiers are resolved against.
pub const SERVICE_DOMAIN: &str = "supabase.co";

/// An error encountered while loading or resolving a configuration profile.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The config file could not be read.
    #[error("Failed to load config file")]
    Io(#[from] io::Error),
    /// The config file is not valid YAML, or has the wrong shape.
    #[error("Invalid configuration")]
    Invalid(#[from] serde_yaml::Error),
    /// The requested profile isn't in the config file.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
    /// The API key can't be sent in a header.
    #[error("API key contains invalid characters")]
    InvalidApiKey,
    /// Neither the profile nor the environment has an API key.
    #[error("No API key found")]
    NoApiKey,
    /// Neither the profile nor the environment names a project.
    #[error("No project URL or identifier found")]
    NoProject,
    /// The project resolved to an unparseable URL.
    #[error("Invalid URI")]
    InvalidUri(#[from] http::uri::InvalidUri),
}

/// A fully resolved configuration profile for talking to a table endpoint.
#[derive(Clone, Serialize)]
pub struct Profile {
    /// The name of the profile.
    pub name: String,
    /// The base URL of the REST endpoint, always ending in `/`. Table names
    /// are appended to it.
    pub base_url: String,
    /// The API key to use for authentication.
    pub api_key: String,
    /// The table that requests are sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// The user-agent used on requests.
    #[serde(skip)]
    pub user_agent: String,
    /// The config file this profile was loaded from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"********")
            .field("table", &self.table)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Values that replace the corresponding profile settings, for example from
/// command-line flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// A project identifier or URL.
    pub project: Option<String>,
    /// An API key.
    pub api_key: Option<String>,
    /// A table name.
    pub table: Option<String>,
}

/// A profile stored in the config file.
#[derive(Debug, Default, Clone, Deserialize)]
struct ConfigProfile {
    pub(crate) project: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) table: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct Config {
    profiles: BTreeMap<String, ConfigProfile>,
}

impl Profile {
    /// Build a profile directly from a project and an API key.
    ///
    /// `project` is either a bare project identifier, which resolves to
    /// `https://<project>.supabase.co/rest/v1/`, or a full `http(s)://` URL
    /// that is used as-is.
    pub fn new(project: &str, api_key: &str, table: Option<&str>) -> Result<Self, Error> {
        let raw = ConfigProfile {
            project: Some(project.to_owned()),
            api_key: Some(api_key.to_owned()),
            table: table.map(str::to_owned),
        };

        Self::from_raw(raw, "default".to_owned(), None)
    }

    /// Load a profile from the configuration file (usually
    /// ~/.config/supatable.yaml). If no configuration file is present, then
    /// the configuration will be loaded solely from the environment.
    ///
    /// If `SUPATABLE_PROFILE` is set, that will be used to select the profile.
    /// Otherwise the profile `default` will be used.
    ///
    /// The following environment variables can override the corresponding
    /// values in the config file:
    ///
    /// | Environment Variable  | Config Value |
    /// |-----------------------|--------------|
    /// | `SUPATABLE_PROJECT`   | `project`    |
    /// | `SUPATABLE_API_KEY`   | `api_key`    |
    /// | `SUPATABLE_TABLE`     | `table`      |
    pub fn from_default_env() -> Result<Self, Error> {
        Self::from_default_env_with(Overrides::default())
    }

    /// Like [Profile::from_default_env], with overrides. See
    /// [Profile::from_env_with].
    pub fn from_default_env_with(overrides: Overrides) -> Result<Self, Error> {
        if let Ok(s) = env::var("SUPATABLE_PROFILE") {
            Self::from_env_with(&s, overrides)
        } else {
            Self::from_env_with("default", overrides)
        }
    }

    /// Load the given profile from the configuration file, with overrides
    /// from the environment. See [Profile::from_default_env].
    pub fn from_env(name: &str) -> Result<Self, Error> {
        Self::from_env_with(name, Overrides::default())
    }

    /// Like [Profile::from_env], but `overrides` take precedence over both
    /// the environment and the configuration file.
    pub fn from_env_with(name: &str, overrides: Overrides) -> Result<Self, Error> {
        let project = overrides
            .project
            .or_else(|| env::var("SUPATABLE_PROJECT").ok());
        let api_key = overrides
            .api_key
            .or_else(|| env::var("SUPATABLE_API_KEY").ok());
        let table = overrides.table.or_else(|| env::var("SUPATABLE_TABLE").ok());

        let config_path = find_config()?;
        let (profile, config_path) = match read_profile(&config_path, name) {
            Ok(p) => (p, Some(config_path)),
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file found");
                (Default::default(), None)
            }
            Err(e) => return Err(e),
        };

        let raw = ConfigProfile {
            project: project.or(profile.project),
            api_key: api_key.or(profile.api_key),
            table: table.or(profile.table),
        };

        Self::from_raw(raw, name.to_owned(), config_path)
    }

    /// Modifies the user-agent to have a different prefix.
    pub fn with_ua_product(self, ua_product: &str) -> Self {
        Self {
            user_agent: make_ua(Some(ua_product)),
            ..self
        }
    }

    /// Bind the profile to a table.
    pub fn with_table(self, table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..self
        }
    }

    /// Iterate through all profiles in the configuration file. Does not read
    /// any environment variables.
    pub fn load_all() -> Result<impl Iterator<Item = Self>, Error> {
        let path = find_config()?;
        Self::read_all(path)
    }

    /// Load the given profile (or 'default') from the given file. Does not
    /// read any environment variables.
    ///
    /// Usually, you will want to use [Profile::from_env] instead.
    pub fn read(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = name.unwrap_or("default").to_owned();
        let profile = read_profile(path, &name)?;
        Self::from_raw(profile, name, Some(path.to_owned()))
    }

    /// Read all profiles from the given file. Does not read any environment
    /// variables.
    pub fn read_all(path: impl AsRef<Path>) -> Result<impl Iterator<Item = Self>, Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;

        let profiles: Result<Vec<_>, Error> = config
            .profiles
            .into_iter()
            .map(|(name, raw)| Profile::from_raw(raw, name, Some(path.to_owned())))
            .collect();

        Ok(profiles?.into_iter())
    }

    fn from_raw(raw: ConfigProfile, name: String, path: Option<PathBuf>) -> Result<Self, Error> {
        let ConfigProfile {
            project,
            api_key,
            table,
        } = raw;

        let base_url = resolve_base_url(&project.ok_or(Error::NoProject)?)?;
        let api_key = api_key.ok_or(Error::NoApiKey)?;
        if !api_key.is_ascii() {
            return Err(Error::InvalidApiKey);
        }

        Ok(Self {
            name,
            base_url,
            api_key,
            table,
            user_agent: make_ua(None),
            config_path: path,
        })
    }
}

/// Resolve a project identifier or URL into the base URL of its REST
/// endpoint.
pub fn resolve_base_url(project: &str) -> Result<String, Error> {
    let project = project.trim();
    let url = if project.starts_with("https://") || project.starts_with("http://") {
        let mut url = project.to_owned();
        if !url.ends_with('/') {
            url.push('/');
        }

        url
    } else {
        format!("https://{project}.{SERVICE_DOMAIN}/rest/v1/")
    };

    url.parse::<http::Uri>()?;
    Ok(url)
}

fn find_config() -> Result<PathBuf, Error> {
    let Some(home) = env::home_dir() else {
        return Err(Error::Io(io::Error::other(
            "No $HOME found for the current user",
        )));
    };

    let canonical = home.join(".config/supatable.yaml");
    if canonical.exists() {
        return Ok(canonical);
    }

    for fallback in [".config/supatable.yml", ".supatable/config.yaml"] {
        let path = home.join(fallback);
        if path.exists() {
            return Ok(path);
        }
    }

    Ok(canonical)
}

fn read_profile(p: &Path, name: &str) -> Result<ConfigProfile, Error> {
    let file = File::open(p)?;
    let mut config: Config = serde_yaml::from_reader(file).map_err(Error::Invalid)?;
    let Some(config_profile) = config.profiles.remove(name) else {
        return Err(Error::ProfileNotFound(name.to_string()));
    };

    debug!(path = %p.display(), "loaded config file");

    Ok(config_profile)
}

fn make_ua(product: Option<&str>) -> String {
    format!(
        "{}/{}",
        product.unwrap_or("supatable"),
        env!("SUPATABLE_VERSION")
    )
}
