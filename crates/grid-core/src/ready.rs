//! Readiness probes: a launched process is not usable just because it
//! spawned.

use grid_types::ReadyCheck;

pub async fn probe(check: &ReadyCheck) -> bool {
    match check {
        ReadyCheck::Path { path } => path.exists(),
        ReadyCheck::Port { port } => {
            tokio::net::TcpStream::connect(("127.0.0.1", *port))
                .await
                .is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn path_probe() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ready");

        let check = ReadyCheck::Path {
            path: marker.clone(),
        };
        assert!(!probe(&check).await);

        std::fs::write(&marker, b"").unwrap();
        assert!(probe(&check).await);
    }

    #[tokio::test]
    async fn port_probe() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(probe(&ReadyCheck::Port { port }).await);

        drop(listener);
        assert!(!probe(&ReadyCheck::Port { port }).await);
    }
}
