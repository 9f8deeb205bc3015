use crate::advisor::Remedy;
use serde::{Deserialize, Serialize};

/// 一次识别的完整结果：预测虫害 + 防治建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    /// 规范化后的虫害名称
    pub pest: String,
    /// 是否命中建议表
    pub recognized: bool,
    /// 首选（最便宜）药剂，未知虫害为占位文本
    pub pesticide: String,
    /// 按价格升序排列的药剂
    pub remedies: Vec<Remedy>,
    /// 有机替代方案
    pub organic: String,
    /// 对土壤的影响
    pub soil_effect: String,
    /// 预测类别的校准概率 (0.0 - 1.0)
    pub confidence: f64,
    /// 处理耗时（毫秒）
    pub processing_time_ms: u64,
    /// 上传图像的访问地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
