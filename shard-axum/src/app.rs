use axum::http::Method;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::{routes, ImagesState};

#[derive(Clone)]
pub struct AxumApp {
    pub state: ImagesState,
    pub router: Router<()>,
}

impl AxumApp {
    pub fn new(state: ImagesState) -> Self {
        let router = routes::router(state.clone());
        Self { state, router }.with_layers()
    }

    /// Request ids, tracing and permissive CORS around everything routed so far
    fn with_layers(mut self) -> Self {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any);

        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        );
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(state: ImagesState) -> AxumApp {
    AxumApp::new(state)
}
