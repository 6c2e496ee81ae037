//! 登入憑證
//!
//! 密碼只存在記憶體中，離開作用域時清除。

use std::fmt;

/// 預先配置的容量，輸入期間不會重新配置而留下舊副本
const SECRET_CAPACITY: usize = 256;

/// Password buffer that zeroes its bytes on drop.
///
/// Never implements `Display`; `Debug` only reveals the length.
pub struct SecureString(String);

impl SecureString {
    pub fn new() -> Self {
        Self::with_capacity(SECRET_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SecureString(String::with_capacity(capacity.max(SECRET_CAPACITY)))
    }

    pub fn push(&mut self, c: char) {
        if self.0.len() + c.len_utf8() > self.0.capacity() {
            // 擴充前先把舊緩衝區清零
            let mut grown = String::with_capacity(self.0.capacity() * 2 + c.len_utf8());
            grown.push_str(&self.0);
            wipe(&mut self.0);
            self.0 = grown;
        }
        self.0.push(c);
    }

    pub fn push_str(&mut self, value: &str) {
        for c in value.chars() {
            self.push(c);
        }
    }

    /// 以 XML 跳脫字元寫入，不產生中間字串
    pub fn push_xml_escaped(&mut self, value: &str) {
        for c in value.chars() {
            match c {
                '&' => self.push_str("&amp;"),
                '<' => self.push_str("&lt;"),
                '>' => self.push_str("&gt;"),
                '"' => self.push_str("&quot;"),
                '\'' => self.push_str("&apos;"),
                _ => self.push(c),
            }
        }
    }

    pub fn pop(&mut self) -> Option<char> {
        let c = self.0.pop()?;
        // pop 只縮短長度，被移除的位元組仍在緩衝區中
        let len = self.0.len();
        unsafe {
            let vec = self.0.as_mut_vec();
            let tail = vec.as_mut_ptr().add(len);
            for i in 0..c.len_utf8() {
                std::ptr::write_volatile(tail.add(i), 0);
            }
        }
        Some(c)
    }

    /// Get the secret as a string slice.
    ///
    /// Only use this when building an authentication request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SecureString {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        let mut secret = SecureString::with_capacity(value.len());
        secret.push_str(value);
        secret
    }
}

impl Clone for SecureString {
    fn clone(&self) -> Self {
        SecureString::from(self.0.as_str())
    }
}

impl AsRef<[u8]> for SecureString {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        wipe(&mut self.0);
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(*** {} bytes ***)", self.0.len())
    }
}

fn wipe(value: &mut String) {
    // SAFETY: 只寫入 0，仍是合法的 UTF-8
    unsafe {
        let vec = value.as_mut_vec();
        let capacity = vec.capacity();
        let ptr = vec.as_mut_ptr();
        for i in 0..capacity {
            std::ptr::write_volatile(ptr.add(i), 0);
        }
        vec.set_len(0);
    }
}

/// SharePoint Online 使用者名稱與密碼
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecureString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecureString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password)
            .finish()
    }
}
