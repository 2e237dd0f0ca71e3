//! Node lifecycle over a real TCP listener.

#[cfg(test)]
mod tests {
    use super::super::*;
    use av_01_asset_store::{StoreError, Token};
    use node_runtime::container::config::{Backend, HttpConfig, StorageConfig};
    use node_runtime::container::{NodeConfig, UserSpec};
    use node_runtime::NodeRuntime;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn node_config() -> NodeConfig {
        NodeConfig {
            http: HttpConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0,
                shutdown_grace: Duration::from_millis(500),
                ..Default::default()
            },
            storage: StorageConfig {
                backend: Backend::Memory,
                ..Default::default()
            },
            users: vec![UserSpec {
                login: "alice".into(),
                password: "wonderland".into(),
            }],
            ..Default::default()
        }
    }

    /// Minimal HTTP/1.1 exchange with `Connection: close`.
    async fn http(addr: SocketAddr, method: &str, path: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut request = format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n",
            method,
            path,
            body.len()
        );
        for (name, value) in headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }
        request.push_str("\r\n");
        request.push_str(body);

        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn token_from(response: &str) -> String {
        let body = response.split("\r\n\r\n").nth(1).expect("body");
        let value: serde_json::Value = serde_json::from_str(body).expect("json");
        value["token"].as_str().expect("token").to_string()
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_binds_token_to_peer_ip() {
        let node = NodeRuntime::start(node_config()).await.unwrap();
        let addr = node.local_addr();

        let health = http(addr, "GET", "/health", &[], "").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.ends_with(r#"{"status":"ok"}"#));

        let auth = http(
            addr,
            "POST",
            "/api/auth",
            &[("Content-Type", "application/json")],
            r#"{"login":"alice","password":"wonderland"}"#,
        )
        .await;
        assert!(auth.starts_with("HTTP/1.1 200"), "{}", auth);
        let token = token_from(&auth);

        // The connection came from loopback, so that is where the token is bound.
        let gateway = node.gateway();
        let token = Token::new(token);
        assert!(gateway.check_token(&token, IpAddr::V4(Ipv4Addr::LOCALHOST)).await.unwrap());
        assert!(!gateway.check_token(&token, IP_A).await.unwrap());

        node.run_until(async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_listener_then_closes_gateway() {
        let node = NodeRuntime::start(node_config()).await.unwrap();
        let addr = node.local_addr();
        let gateway = node.gateway();

        node.run_until(async {}).await.unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
        assert!(matches!(
            gateway.list_assets(&Token::new("t"), IP_A).await,
            Err(StoreError::Closed)
        ));
    }
}
