//! TLS configuration shared by drivers that negotiate rustls themselves.

use rustls::ClientConfig;

/// Build a rustls client configuration trusting the webpki root set.
///
/// Used by the PostgreSQL driver when the connection string requests
/// `sslmode=require` or stronger; server certificates are always verified.
pub fn client_config() -> ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
