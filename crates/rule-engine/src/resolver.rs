//! 点号路径解析
//!
//! 沿着 `a.b.c` 逐层查找映射中的键。任一层不是映射、键不存在或值为 null 时立即返回 `None`。
//! 数组不支持下标访问，视为非映射。

use serde_json::Value;

/// 按点号分隔的路径解析字段值
///
/// 空字符串路径被视为单个空键 `""`，通常无法命中。
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    resolve_segments(record, path.split('.'))
}

/// 按预先切分好的路径段解析字段值
///
/// 路径段为空时返回记录本身。
pub fn resolve_segments<'a, 's, I>(record: &'a Value, segments: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = &'s str>,
{
    let mut current = record;

    for segment in segments {
        current = match current.as_object()?.get(segment)? {
            Value::Null => return None,
            value => value,
        };
    }

    Some(current)
}
