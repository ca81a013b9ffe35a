use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::Engine;
use digit_recognizer::{
    models::{InputShape, Manifest, ManifestEntry, ModelRegistry, Predictor},
    web::{create_app, AppState},
    Config, Result,
};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use ndarray::{ArrayD, IxDyn};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

/// 记录每次调用的输入形状，返回固定的softmax分布
struct FakeModel {
    shapes: Mutex<Vec<Vec<usize>>>,
    scores: Vec<f32>,
}

impl FakeModel {
    fn confident(class: usize) -> Arc<Self> {
        let mut scores = vec![0.01; 10];
        scores[class] = 0.91;
        Arc::new(Self {
            shapes: Mutex::new(Vec::new()),
            scores,
        })
    }

    fn shapes(&self) -> Vec<Vec<usize>> {
        self.shapes.lock().clone()
    }
}

impl Predictor for FakeModel {
    fn predict(&self, input: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.shapes.lock().push(input.shape().to_vec());
        Ok(ArrayD::from_shape_vec(IxDyn(&[1, self.scores.len()]), self.scores.clone()).unwrap())
    }
}

fn config() -> Config {
    Config::new("127.0.0.1:0".into(), ".", None, None, Some(1), false).unwrap()
}

fn entry(name: &str, file: &str) -> ManifestEntry {
    ManifestEntry {
        name: name.to_string(),
        file: file.to_string(),
        input_shape: None,
    }
}

struct TestApp {
    app: Router,
    cnn: Arc<FakeModel>,
    mlp: Arc<FakeModel>,
}

/// cnn 和 mlp 已加载，清单里的 broken 加载失败
fn digits_app() -> TestApp {
    let manifest = Manifest {
        models: vec![
            entry("cnn", "cnn_model.onnx"),
            entry("mlp", "mlp_model.onnx"),
            entry("broken", "broken.onnx"),
        ],
    };
    let cnn = FakeModel::confident(7);
    let mlp = FakeModel::confident(2);

    let mut registry = ModelRegistry::new(manifest);
    registry
        .insert("cnn", InputShape::resolve("cnn", None).unwrap(), cnn.clone())
        .unwrap();
    registry
        .insert("mlp", InputShape::resolve("mlp", None).unwrap(), mlp.clone())
        .unwrap();

    TestApp {
        app: create_app(AppState::new(registry, config())),
        cnn,
        mlp,
    }
}

fn empty_app() -> Router {
    create_app(AppState::new(ModelRegistry::new(Manifest::default()), config()))
}

fn white_png_base64() -> String {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(28, 28, Luma([255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    base64::engine::general_purpose::STANDARD.encode(buf)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn predict(app: &Router, model: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(format!("/predict/{}", model))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_model_info_reports_load_status() {
    let test = digits_app();
    let (status, body) = get(&test.app, "/model_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"models": [
            {"name": "cnn", "file": "cnn_model.onnx", "loaded": true},
            {"name": "mlp", "file": "mlp_model.onnx", "loaded": true},
            {"name": "broken", "file": "broken.onnx", "loaded": false}
        ]})
    );
}

#[tokio::test]
async fn test_predict_dispatches_shape_per_model() {
    let test = digits_app();
    let image = white_png_base64();

    let (status, body) = predict(&test.app, "cnn", json!({"image_base64": image})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 7);

    let (status, body) = predict(&test.app, "mlp", json!({"image_base64": image})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 2);
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((confidence - 0.91).abs() < 1e-6);

    assert_eq!(test.cnn.shapes(), vec![vec![1, 28, 28, 1]]);
    assert_eq!(test.mlp.shapes(), vec![vec![1, 784]]);
}

#[tokio::test]
async fn test_unknown_model_is_404() {
    let test = digits_app();
    let (status, body) =
        predict(&test.app, "unknown", json!({"image_base64": white_png_base64()})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Model not found"}));
}

#[tokio::test]
async fn test_failed_model_is_listed_but_404s() {
    let test = digits_app();
    let (status, _) =
        predict(&test.app, "broken", json!({"image_base64": white_png_base64()})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_model_name_is_case_insensitive() {
    let test = digits_app();
    let image = white_png_base64();

    let (lower_status, lower) = predict(&test.app, "cnn", json!({"image_base64": image})).await;
    let (upper_status, upper) = predict(&test.app, "CNN", json!({"image_base64": image})).await;
    let (mixed_status, mixed) = predict(&test.app, "CnN", json!({"image_base64": image})).await;

    assert_eq!(lower_status, StatusCode::OK);
    assert_eq!(upper_status, lower_status);
    assert_eq!(mixed_status, lower_status);
    assert_eq!(lower, upper);
    assert_eq!(lower, mixed);
}

#[tokio::test]
async fn test_data_uri_prefix_matches_bare_payload() {
    let test = digits_app();
    let image = white_png_base64();

    let (_, bare) = predict(&test.app, "mlp", json!({"image_base64": image})).await;
    let (status, prefixed) = predict(
        &test.app,
        "mlp",
        json!({"image_base64": format!("data:image/png;base64,{}", image)}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bare, prefixed);
}

#[tokio::test]
async fn test_malformed_base64_is_client_error() {
    let test = digits_app();
    let (status, body) = predict(&test.app, "cnn", json!({"image_base64": "@@not-base64@@"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Base64"));
    assert!(test.cnn.shapes().is_empty());
}

#[tokio::test]
async fn test_non_image_payload_is_client_error() {
    let test = digits_app();
    let payload = base64::engine::general_purpose::STANDARD.encode(b"plain text, not pixels");
    let (status, _) = predict(&test.app, "cnn", json!({"image_base64": payload})).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_unaccepted_media_type_is_415() {
    let test = digits_app();
    let payload = format!("data:application/pdf;base64,{}", white_png_base64());
    let (status, _) = predict(&test.app, "cnn", json!({"image_base64": payload})).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_invalid_body_is_422() {
    let test = digits_app();

    let (status, _) = predict(&test.app, "cnn", json!({"image": "abc"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = predict(&test.app, "cnn", json!({"image_base64": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("image_base64"));
}

#[tokio::test]
async fn test_empty_manifest_serves_nothing() {
    let app = empty_app();

    let (status, body) = get(&app, "/model_info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"models": []}));

    for name in ["cnn", "mlp", "anything"] {
        let (status, body) = predict(&app, name, json!({"image_base64": white_png_base64()})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Model not found");
    }
}

#[tokio::test]
async fn test_declared_shape_overrides_name_convention() {
    let manifest = Manifest {
        models: vec![ManifestEntry {
            name: "lenet".into(),
            file: "lenet.onnx".into(),
            input_shape: Some(vec![1, 28, 28]),
        }],
    };
    let lenet = FakeModel::confident(4);
    let shape = InputShape::resolve("lenet", Some(&[1, 28, 28])).unwrap();
    let mut registry = ModelRegistry::new(manifest);
    registry.insert("lenet", shape, lenet.clone()).unwrap();
    let app = create_app(AppState::new(registry, config()));

    let (status, body) = predict(&app, "lenet", json!({"image_base64": white_png_base64()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 4);
    assert_eq!(lenet.shapes(), vec![vec![1, 1, 28, 28]]);

    let (_, info) = get(&app, "/model_info").await;
    assert_eq!(info["models"][0]["input_shape"], json!([1, 28, 28]));
}

#[tokio::test]
async fn test_health_reports_loaded_models() {
    let test = digits_app();
    let (status, body) = get(&test.app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models_loaded"], 2);
}
