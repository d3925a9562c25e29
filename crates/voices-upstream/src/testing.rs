//! A throwaway HTTP server for exercising the clients end to end.

use axum::Router;
use tokio::net::TcpListener;

/// Bind a loopback port, build the router with the server's base URL, and
/// serve it in the background. Returns the base URL.
pub async fn serve(router: impl FnOnce(String) -> Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let base = format!("http://{}", listener.local_addr().unwrap());
  let app = router(base.clone());
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  base
}
