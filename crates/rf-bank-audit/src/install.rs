//! Installer — registers the audit as a Wwise add-on command
//!
//! Writes a command definition into `<authoring>/Data/Add-ons/Commands` and
//! copies the running executable next to it. Wwise picks the command up on
//! its next start.

use std::fs;
use std::path::{Path, PathBuf};

use rf_waapi::{WaapiCall, WaapiSession};
use serde::{Deserialize, Serialize};

use crate::audit::normalize_path;
use crate::error::{AuditError, AuditResult};
use crate::queries::ProjectQueries;

/// Add-on command id
pub const COMMAND_ID: &str = "garena.check_event_inclusion";

/// Menu entry label
pub const COMMAND_DISPLAY_NAME: &str = "Check Event Inclusion";

/// Command definition file name
pub const COMMAND_DEF_FILE: &str = "check_event_inclusion.json";

/// One process per invocation, single selection
pub const COMMAND_START_MODE: &str = "SingleSelectionSingleProcess";

/// Add-on command definition file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinitionFile {
    pub commands: Vec<CommandDefinition>,
}

/// One add-on command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    pub id: String,
    pub display_name: String,
    pub program: String,
    pub args: String,
    pub start_mode: String,
    pub main_menu: MainMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainMenu {
    pub base_path: String,
}

/// Add-on commands directory of a Wwise install
pub fn commands_dir(authoring: &Path) -> PathBuf {
    normalize_path(&authoring.join("Data").join("Add-ons").join("Commands"))
}

/// Definition running `program check "<project>" "<log_dir>" <port>`
pub fn command_definition(
    program: &Path,
    project_path: &Path,
    log_dir: &Path,
    waapi_port: u16,
    base_menu: &str,
) -> CommandDefinition {
    CommandDefinition {
        id: COMMAND_ID.to_string(),
        display_name: COMMAND_DISPLAY_NAME.to_string(),
        program: program.display().to_string(),
        args: format!(
            "check \"{}\" \"{}\" {}",
            project_path.display(),
            log_dir.display(),
            waapi_port
        ),
        start_mode: COMMAND_START_MODE.to_string(),
        main_menu: MainMenu {
            base_path: base_menu.to_string(),
        },
    }
}

/// What to install
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Port baked into the command arguments
    pub waapi_port: u16,

    /// Main menu the command appears under
    pub base_menu: String,

    /// Report directory baked into the command arguments
    pub log_dir: PathBuf,

    /// Executable to copy into the add-ons directory
    pub executable: PathBuf,
}

/// Where things were installed
#[derive(Debug, Clone, PartialEq)]
pub struct InstallOutcome {
    pub wwise_version: String,
    pub definition_path: PathBuf,
    pub program_path: PathBuf,
}

/// Installs the add-on command for the project open in Wwise
pub struct Installer;

impl Installer {
    /// Install over `session`, then close it whatever the outcome
    pub async fn run<S: WaapiSession>(
        session: S,
        request: &InstallRequest,
    ) -> AuditResult<InstallOutcome> {
        let result = Self::install(&session, request).await;

        if let Err(e) = session.close().await {
            log::warn!("[Install] WAAPI session did not close cleanly: {}", e);
        }

        result
    }

    /// Install over an already open connection
    pub async fn install<C: WaapiCall>(
        client: &C,
        request: &InstallRequest,
    ) -> AuditResult<InstallOutcome> {
        let queries = ProjectQueries::new(client);

        let info = queries.wwise_info().await?;
        log::info!("[Install] Installing for Wwise: {}", info.version.display_name);

        let install_dir = commands_dir(&info.directories.authoring);
        log::info!("[Install] Installing under: '{}'", install_dir.display());

        let project_path = normalize_path(&queries.project_path().await?);
        log::info!("[Install] Installing for project: {}", project_path.display());

        let exe_name = request.executable.file_name().ok_or_else(|| {
            AuditError::Config(format!(
                "executable path '{}' has no file name",
                request.executable.display()
            ))
        })?;
        let program_path = install_dir.join(exe_name);

        fs::create_dir_all(&install_dir)
            .map_err(|e| AuditError::io("creating add-ons directory", &install_dir, e))?;

        log::info!("[Install] Creating command definition, menu base path: {}", request.base_menu);
        let definition = CommandDefinitionFile {
            commands: vec![command_definition(
                &program_path,
                &project_path,
                &normalize_path(&request.log_dir),
                request.waapi_port,
                &request.base_menu,
            )],
        };
        let definition_path = install_dir.join(COMMAND_DEF_FILE);
        write_definition(&definition_path, &definition)?;

        install_executable(&request.executable, &program_path)?;

        log::info!(
            "[Install] Install done. Restart Wwise and try {}/{} in the main menu.",
            request.base_menu,
            COMMAND_DISPLAY_NAME
        );

        Ok(InstallOutcome {
            wwise_version: info.version.display_name,
            definition_path,
            program_path,
        })
    }
}

/// Allow writing over a file Wwise or source control left read-only
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> AuditResult<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(AuditError::io("inspecting", path, e)),
    };

    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)
            .map_err(|e| AuditError::io("clearing read-only flag on", path, e))?;
    }
    Ok(())
}

fn write_definition(path: &Path, definition: &CommandDefinitionFile) -> AuditResult<()> {
    make_writable(path)?;

    let json = serde_json::to_string_pretty(definition)
        .map_err(|e| AuditError::io("serializing command definition", path, e.into()))?;
    fs::write(path, json).map_err(|e| AuditError::io("writing command definition", path, e))
}

fn install_executable(source: &Path, target: &Path) -> AuditResult<()> {
    if normalize_path(source) == normalize_path(target) {
        log::info!("[Install] Executable already in place");
        return Ok(());
    }

    if target.exists() {
        make_writable(target)?;
        fs::remove_file(target).map_err(|e| AuditError::io("removing old executable", target, e))?;
    }
    fs::copy(source, target).map_err(|e| AuditError::io("copying executable to", target, e))?;
    Ok(())
}
