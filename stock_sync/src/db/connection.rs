//! PostgreSQL connection parameters and the async connection helper.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use diesel_async::AsyncPgConnection;
use rustls::{
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature},
    pki_types::{CertificateDer, ServerName, UnixTime, pem::PemObject},
};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::{EnvError, get_env_var, get_optional_env_var, parse_optional_env_var};
use thiserror::Error;
use tokio_postgres::{NoTls, config::SslMode as PgSslMode};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{info, warn};

/// Default port when `DB_PORT` is unset.
pub const DEFAULT_PORT: u16 = 5432;
/// Default database name when `DB_NAME` is unset.
pub const DEFAULT_DB_NAME: &str = "stock";

/// Whether the connection is encrypted and how far the server is trusted.
///
/// The modes follow libpq, so `migrate` (which goes through libpq) and the
/// async connection agree on the same `DB_SSLMODE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Plain TCP.
    #[default]
    Disable,
    /// TLS when the server offers it, plain TCP otherwise. The server
    /// certificate is not checked.
    Prefer,
    /// TLS or fail. The server certificate is not checked.
    Require,
    /// TLS with the certificate chain and host name verified against
    /// `DB_SSLROOTCERT`, or the bundled webpki roots when that is unset.
    VerifyFull,
}

impl SslMode {
    /// libpq keyword for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(format!(
                "unknown sslmode '{other}', expected disable, prefer, require or verify-full"
            )),
        }
    }
}

/// Everything needed to reach the store.
pub struct DbConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: SecretString,
    /// Database name.
    pub dbname: String,
    /// Transport encryption.
    pub sslmode: SslMode,
    /// PEM file of trusted CA certificates for `verify-full`.
    pub sslrootcert: Option<PathBuf>,
}

impl DbConfig {
    /// Reads `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`,
    /// `DB_SSLMODE` and `DB_SSLROOTCERT`.
    pub fn from_env() -> Result<Self, EnvError> {
        Ok(Self {
            host: get_env_var("DB_HOST")?,
            port: parse_optional_env_var("DB_PORT")?.unwrap_or(DEFAULT_PORT),
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            dbname: get_optional_env_var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            sslmode: parse_optional_env_var("DB_SSLMODE")?.unwrap_or_default(),
            sslrootcert: get_optional_env_var("DB_SSLROOTCERT").map(PathBuf::from),
        })
    }

    /// libpq keyword/value connection string, e.g. for the migration runner.
    pub fn conninfo(&self) -> SecretString {
        let mut info = format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.user),
            quote_conninfo(self.password.expose_secret()),
            quote_conninfo(&self.dbname),
            self.sslmode,
        );
        if let Some(path) = &self.sslrootcert {
            info.push_str(" sslrootcert=");
            info.push_str(&quote_conninfo(&path.to_string_lossy()));
        }
        SecretString::from(info)
    }

    fn pg_config(&self, sslmode: PgSslMode) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host);
        pg.port(self.port);
        pg.user(&self.user);
        let password = self.password.expose_secret();
        if !password.is_empty() {
            pg.password(password);
        }
        pg.dbname(&self.dbname);
        pg.ssl_mode(sslmode);
        pg
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .field("sslrootcert", &self.sslrootcert)
            .finish_non_exhaustive()
    }
}

/// Single-quotes a conninfo value, escaping `\` and `'`.
fn quote_conninfo(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if matches!(c, '\\' | '\'') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Failure to open a database connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// TCP, TLS handshake or authentication failed.
    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The connection opened but diesel could not take it over.
    #[error("PostgreSQL connection setup failed: {0}")]
    Diesel(#[from] diesel::ConnectionError),

    /// The TLS client configuration could not be built.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    /// `DB_SSLROOTCERT` could not be read as PEM certificates.
    #[error("cannot load root certificates from {}: {message}", path.display())]
    RootCert {
        /// The configured file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// Opens an async connection according to `config.sslmode`.
///
/// `prefer` retries over plain TCP when the TLS attempt fails, like libpq.
pub async fn connect_postgres(config: &DbConfig) -> Result<AsyncPgConnection, ConnectError> {
    let conn = match config.sslmode {
        SslMode::Disable => {
            let (client, connection) = config.pg_config(PgSslMode::Disable).connect(NoTls).await?;
            AsyncPgConnection::try_from_client_and_connection(client, connection).await?
        }
        SslMode::Prefer => {
            let tls = tls_connector(config)?;
            match config.pg_config(PgSslMode::Prefer).connect(tls).await {
                Ok((client, connection)) => {
                    AsyncPgConnection::try_from_client_and_connection(client, connection).await?
                }
                Err(error) => {
                    warn!(%error, "TLS connection failed, retrying without TLS");
                    let (client, connection) =
                        config.pg_config(PgSslMode::Disable).connect(NoTls).await?;
                    AsyncPgConnection::try_from_client_and_connection(client, connection).await?
                }
            }
        }
        SslMode::Require | SslMode::VerifyFull => {
            let tls = tls_connector(config)?;
            let (client, connection) = config.pg_config(PgSslMode::Require).connect(tls).await?;
            AsyncPgConnection::try_from_client_and_connection(client, connection).await?
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        dbname = %config.dbname,
        sslmode = %config.sslmode,
        "connected to PostgreSQL"
    );
    Ok(conn)
}

fn tls_connector(config: &DbConfig) -> Result<MakeRustlsConnect, ConnectError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let tls = match config.sslmode {
        SslMode::VerifyFull => {
            let roots = match &config.sslrootcert {
                Some(path) => load_root_certs(path)?,
                None => RootCertStore {
                    roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
                },
            };
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        SslMode::Disable | SslMode::Prefer | SslMode::Require => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth(),
    };
    Ok(MakeRustlsConnect::new(tls))
}

fn load_root_certs(path: &Path) -> Result<RootCertStore, ConnectError> {
    let root_cert_error = |message: String| ConnectError::RootCert {
        path: path.to_path_buf(),
        message,
    };

    let mut roots = RootCertStore::empty();
    for cert in CertificateDer::pem_file_iter(path).map_err(|e| root_cert_error(e.to_string()))? {
        roots.add(cert.map_err(|e| root_cert_error(e.to_string()))?)?;
    }
    if roots.is_empty() {
        return Err(root_cert_error("no certificates found".to_string()));
    }
    Ok(roots)
}

/// Encrypts without authenticating the server, which is what libpq's
/// `prefer` and `require` do. Handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
