//! 类别名称表 (class id → label)

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use phf::phf_map;

/// COCO 80类 (YOLOv8 默认)
static COCO_NAMES: phf::Map<u32, &'static str> = phf_map! {
    0u32 => "person", 1u32 => "bicycle", 2u32 => "car", 3u32 => "motorcycle",
    4u32 => "airplane", 5u32 => "bus", 6u32 => "train", 7u32 => "truck",
    8u32 => "boat", 9u32 => "traffic light", 10u32 => "fire hydrant", 11u32 => "stop sign",
    12u32 => "parking meter", 13u32 => "bench", 14u32 => "bird", 15u32 => "cat",
    16u32 => "dog", 17u32 => "horse", 18u32 => "sheep", 19u32 => "cow",
    20u32 => "elephant", 21u32 => "bear", 22u32 => "zebra", 23u32 => "giraffe",
    24u32 => "backpack", 25u32 => "umbrella", 26u32 => "handbag", 27u32 => "tie",
    28u32 => "suitcase", 29u32 => "frisbee", 30u32 => "skis", 31u32 => "snowboard",
    32u32 => "sports ball", 33u32 => "kite", 34u32 => "baseball bat", 35u32 => "baseball glove",
    36u32 => "skateboard", 37u32 => "surfboard", 38u32 => "tennis racket", 39u32 => "bottle",
    40u32 => "wine glass", 41u32 => "cup", 42u32 => "fork", 43u32 => "knife",
    44u32 => "spoon", 45u32 => "bowl", 46u32 => "banana", 47u32 => "apple",
    48u32 => "sandwich", 49u32 => "orange", 50u32 => "broccoli", 51u32 => "carrot",
    52u32 => "hot dog", 53u32 => "pizza", 54u32 => "donut", 55u32 => "cake",
    56u32 => "chair", 57u32 => "couch", 58u32 => "potted plant", 59u32 => "bed",
    60u32 => "dining table", 61u32 => "toilet", 62u32 => "tv", 63u32 => "laptop",
    64u32 => "mouse", 65u32 => "remote", 66u32 => "keyboard", 67u32 => "cell phone",
    68u32 => "microwave", 69u32 => "oven", 70u32 => "toaster", 71u32 => "sink",
    72u32 => "refrigerator", 73u32 => "book", 74u32 => "clock", 75u32 => "vase",
    76u32 => "scissors", 77u32 => "teddy bear", 78u32 => "hair drier", 79u32 => "toothbrush",
};

/// 类别名称表
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassNames {
    names: HashMap<u32, String>,
}

impl ClassNames {
    pub fn new(names: HashMap<u32, String>) -> Self {
        Self { names }
    }

    /// COCO 80类
    pub fn coco() -> Self {
        Self {
            names: COCO_NAMES
                .entries()
                .map(|(id, name)| (*id, name.to_string()))
                .collect(),
        }
    }

    /// 从JSON文件加载: `{"0": "person", "1": "bicycle"}`
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("读取类别名称表失败: {}", path.display()))?;
        let names: HashMap<u32, String> = serde_json::from_str(&json)
            .with_context(|| format!("解析类别名称表失败: {}", path.display()))?;
        Ok(Self { names })
    }

    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// 显示名称, 未登记的类别返回 `id<class_id>`
    pub fn display_name(&self, class_id: u32) -> String {
        match self.get(class_id) {
            Some(name) => name.to_string(),
            None => format!("id{}", class_id),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_table() {
        let names = ClassNames::coco();
        assert_eq!(names.len(), 80);
        assert_eq!(names.get(0), Some("person"));
        assert_eq!(names.get(79), Some("toothbrush"));
    }

    #[test]
    fn test_unmapped_class_placeholder() {
        let names = ClassNames::default();
        assert_eq!(names.display_name(42), "id42");
    }

    #[test]
    fn test_load_from_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"0": "visitor", "3": "cart"}"#).unwrap();
        let names = ClassNames::load(file.path()).unwrap();
        assert_eq!(names.display_name(3), "cart");
        assert_eq!(names.display_name(1), "id1");
    }
}
