use serde::{Deserialize, Serialize};

/// 游标分页结果
///
/// 游标是不透明的续传令牌，原样回传即可；空字符串表示没有更多数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    #[serde(default)]
    pub cursor: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// 服务端返回但解码失败而被跳过的条目数
    #[serde(default)]
    pub skipped: usize,
}

impl<T> Default for CursorPage<T> {
    fn default() -> Self {
        Self {
            cursor: String::new(),
            data: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> CursorPage<T> {
    pub fn new(cursor: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            cursor: cursor.into(),
            data,
            skipped: 0,
        }
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 本页之后是否已经到达流末尾：服务端返回空页、空游标或游标没有前进
    ///
    /// 条目全部解码失败的页不算空页，游标仍然有效。
    pub fn is_end_of_stream(&self, previous_cursor: &str) -> bool {
        (self.data.is_empty() && self.skipped == 0)
            || self.cursor.is_empty()
            || self.cursor == previous_cursor
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> CursorPage<U> {
        CursorPage {
            cursor: self.cursor,
            data: self.data.into_iter().map(f).collect(),
            skipped: self.skipped,
        }
    }
}

/// 页码分页结果
///
/// `page_count` 小于请求的 page_size 时即为最后一页。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    #[serde(default)]
    pub page_count: usize,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// 服务端返回但解码失败而被跳过的条目数
    #[serde(default)]
    pub skipped: usize,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            page_count: 0,
            data: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> PageResult<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            page_count: data.len(),
            data,
            skipped: 0,
        }
    }

    pub fn is_last_page(&self, page_size: usize) -> bool {
        self.page_count < page_size
    }
}
