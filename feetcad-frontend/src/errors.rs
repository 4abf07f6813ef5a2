use feetcad_engine::errors::EngineError;
use feetcad_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("加载方案失败: {0}")]
    Scheme(#[from] IoError),
    #[error("查看器操作失败: {0}")]
    Engine(#[from] EngineError),
}
