//! 결과 렌더링 포트 구현 어댑터.

use crate::application::ports::ResultRenderer;
use crate::domain::instance::{Instance, MethodResult};
use crate::domain::object_path::ObjectPath;
use crate::infrastructure::render;

/// 평문 텍스트 렌더링 어댑터.
pub struct TextRendererAdapter;

impl ResultRenderer for TextRendererAdapter {
    fn render_object_path(&self, path: &ObjectPath) -> String {
        render::render_object_path(path)
    }

    fn render_instance(&self, instance: &Instance) -> String {
        render::render_instance(instance)
    }

    fn render_method_result(&self, result: &MethodResult) -> String {
        render::render_method_result(result)
    }
}
