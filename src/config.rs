//! Generator configuration.
//!
//! A [`SwaggerConfig`] carries the document skeleton ([`SwaggerDoc`]), the source folders
//! scanned for component types, the path of the cached document, the serving endpoint and
//! the `active` switch. It can be built in code or loaded from a JSON or YAML file whose
//! keys follow the camelCase layout below:
//!
//! ```yaml
//! active: true
//! endpoint: /api-docs
//! jsonPath: target/swagger.json
//! folders: [src/models]
//! swaggerDoc:
//!   openapi: 3.0.0
//!   basePath: /api
//!   info: { title: Service, version: 1.0.0 }
//!   servers:
//!     - url: http://localhost:4000
//! ```

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of an [`OpenApiGenerator`](crate::generator::OpenApiGenerator)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerConfig {
    /// Document skeleton copied into the generated document
    pub swagger_doc: SwaggerDoc,
    /// Folders (or single files) scanned for component types
    #[serde(default)]
    pub folders: Vec<PathBuf>,
    /// Where the generated document is cached
    pub json_path: PathBuf,
    /// Serving path of the UI; the raw document lives at `{endpoint}.json`
    pub endpoint: String,
    /// Disables generation and serving entirely when false
    #[serde(default)]
    pub active: bool,
}

/// The static part of the OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDoc {
    pub openapi: String,
    /// Prefix stripped from every documented path and appended to every server URL.
    /// Never serialized into the generated document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub url: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub url: String,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SwaggerConfig {
    /// Create an active configuration with no source folders
    pub fn new(swagger_doc: SwaggerDoc, json_path: impl Into<PathBuf>, endpoint: &str) -> Self {
        Self {
            swagger_doc,
            folders: Vec::new(),
            json_path: json_path.into(),
            endpoint: endpoint.to_string(),
            active: true,
        }
    }

    /// Add a source folder to scan for component types
    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folders.push(folder.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Load a configuration from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown extension, or does not
    /// deserialize into a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading swagger configuration from {}", path.display());
        let content = fs::read_to_string(path)?;

        let config: SwaggerConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported configuration format: {:?}",
                    other.unwrap_or("<none>")
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the gate relies on
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with('/') {
            return Err(Error::InvalidArgument(format!(
                "endpoint must start with '/': {}",
                self.endpoint
            )));
        }
        if let Some(base_path) = &self.swagger_doc.base_path {
            if !base_path.is_empty() && !base_path.starts_with('/') {
                return Err(Error::InvalidArgument(format!(
                    "basePath must be empty or start with '/': {}",
                    base_path
                )));
            }
        }
        Ok(())
    }
}

impl SwaggerDoc {
    /// A 3.0.0 skeleton with the given title and version and no servers
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            openapi: "3.0.0".to_string(),
            base_path: None,
            info: Info {
                title: title.to_string(),
                version: version.to_string(),
                description: None,
                contact: None,
                terms_of_service: None,
                license: None,
            },
            servers: Vec::new(),
        }
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Some(base_path.to_string());
        self
    }

    pub fn with_server(mut self, url: &str, description: Option<&str>) -> Self {
        self.servers.push(Server {
            url: url.to_string(),
            description: description.map(str::to_string),
        });
        self
    }

    /// The configured base path, or `""`
    pub fn base_path(&self) -> &str {
        self.base_path.as_deref().unwrap_or("")
    }
}
