//! Built-in rule tables.
//!
//! Entries are matched case-insensitively; casing here is cosmetic and mirrors
//! how the names usually appear in the wild.

/// Administrative shares that are never worth descending into.
pub(crate) const EXCLUDED_DIRECTORY_NAMES: &[&str] = &["IPC$", "PRINT$"];

/// Directory names whose presence alone is worth reporting.
pub(crate) const INTERESTING_DIRECTORY_NAMES: &[&str] = &["C$", "ADMIN$", "SCCMCONTENTLIB$"];

// Images, fonts, lockfiles and stylesheets: high volume, low signal.
pub(crate) const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".bmp", ".eps", ".gif", ".ico", ".jfi", ".jfif", ".jif", ".jpe", ".jpeg", ".jpg", ".png", ".psd", ".svg", ".tif",
    ".tiff", ".webp", ".xcf", ".ttf", ".otf", ".lock", ".css", ".less", ".admx", ".adml", ".xsd",
];

/// Known-benign files that would otherwise trip the name or extension rules.
pub(crate) const EXCLUDED_PATH_SUFFIXES: &[&str] = &["jmxremote/.password/.template", "sceregvl/.inf"];

pub(crate) const INTERESTING_FILENAME_SUBSTRINGS: &[&str] = &[
    // Generic tokens
    "PASSW",
    "SECRET",
    "CREDENTIAL",
    "THYCOTIC",
    "CYBERARK",
    // Shell, language and tool dotfiles
    "ConsoleHost_history.txt",
    ".htpasswd",
    "LocalSettings.php",
    "database.yml",
    ".secret_token.rb",
    "knife.rb",
    "carrierwave.rb",
    "omniauth.rb",
    ".functions",
    ".exports",
    ".netrc",
    ".extra",
    ".npmrc",
    ".env",
    ".bashrc",
    ".profile",
    ".zshrc",
    ".bash_history",
    ".zsh_history",
    ".sh_history",
    "zhistory",
    ".irb_history",
    "credentials.xml",
    "SensorConfiguration.json",
    ".var",
    "Variables.dat",
    "Policy.xml",
    // Windows deployment and memory artefacts
    "unattend.xml",
    "Autounattend.xml",
    "proftpdpasswd",
    "filezilla.xml",
    "lsass.dmp",
    "lsass.exe.dmp",
    "hiberfil.sys",
    "MEMORY.DMP",
    // Network gear
    "running-config.cfg",
    "startup-config.cfg",
    "running-config",
    "startup-config",
    "cisco",
    "router",
    "firewall",
    "switch",
    // Unix account databases
    "shadow",
    "pwd.db",
    "passwd",
    // CyberArk vault components
    "Psmapp.cred",
    "psmgw.cred",
    "backup.key",
    "MasterReplicationUser.pass",
    "RecPrv.key",
    "ReplicationUser.pass",
    "Server.key",
    "VaultEmergency.pass",
    "VaultUser.pass",
    "Vault.ini",
    "PADR.ini",
    "PARAgent.ini",
    "CACPMScanner.exe.config",
    "PVConfiguration.xml",
    // Registry hives and AD database
    "NTDS.DIT",
    "SYSTEM",
    "SAM",
    "SECURITY",
    // Database clients
    ".tugboat",
    "logins.json",
    "SqlStudio.bin",
    ".mysql_history",
    ".psql_history",
    ".pgpass",
    ".dbeaver-data-sources.xml",
    "credentials-config.json",
    "dbvis.xml",
    "robomongo.json",
    ".git-credentials",
    // Hand-rolled password stores
    "passwords.txt",
    "password.txt",
    "pass.txt",
    "accounts.txt",
    "passwords.doc",
    "passwords.docx",
    "pass.doc",
    "accounts.doc",
    "accounts.docx",
    "passwords.xls",
    "pass.xls",
    "accounts.xls",
    "pass.docx",
    "passwords.xlsx",
    "pass.xlsx",
    "accounts.xlsx",
    "secrets.txt",
    "secrets.doc",
    "secrets.xls",
    "secrets.docx",
    "secrets.xlsx",
    // Remote access clients
    "recentservers.xml",
    "sftp-config.json",
    "mobaxterm.ini",
    "mobaxterm backup.zip",
    "confCons.xml",
    // Private keys
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
];

pub(crate) const INTERESTING_EXTENSIONS: &[&str] = &[
    // PowerShell and .NET
    ".psd1", ".psm1", ".ps1", ".aspx", ".ashx", ".asmx", ".asp", ".cshtml", ".cs", ".ascx", ".config",
    // Batch and configuration formats
    ".bat", ".cmd", ".yaml", ".yml", ".toml", ".xml", ".json", ".ini", ".inf", ".cnf", ".conf", ".properties", ".env",
    ".dist", ".txt", ".sql", ".log", ".sqlite", ".sqlite3", ".fdb", ".tfvars",
    // Web and scripting languages
    ".jsp", ".do", ".java", ".cfm", ".js", ".cjs", ".mjs", ".ts", ".tsx", ".ls", ".es6", ".es", ".php", ".phtml",
    ".inc", ".php3", ".php5", ".php7", ".pl", ".py", ".rb", ".vbs", ".vbe", ".wsf", ".wsc", ".hta",
    // Certificates and keys
    ".pem", ".der", ".pfx", ".pk12", ".p12", ".pkcs12",
    // Databases, images, dumps and captures
    ".mdf", ".sdf", ".sqldump", ".bak", ".wim", ".ova", ".ovf", ".cscfg", ".dmp", ".cred", ".pass", ".pcap", ".cap",
    ".pcapng",
    // Password managers and remote access profiles
    ".kdbx", ".kdb", ".psafe3", ".kwallet", ".keychain", ".agilekeychain", ".rdg", ".rtsz", ".rtsx", ".ovpn", ".rdp",
    ".ppk",
];

/// Hand-curated locations; these win over every name and extension rule.
pub(crate) const INTERESTING_PATH_SUFFIXES: &[&str] = &[
    "jenkins/.plugins/.publish_over_ssh/.BapSshPublisherPlugin.xml",
    "control/customsettings.ini",
    ".aws",
    "doctl/config.yaml",
    ".ssh",
    ".azure",
];
