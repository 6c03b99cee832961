//! IO helper: safe file read/write for JSON

use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::model::data_core::AppError;

/// 从文件读取JSON数据
pub fn read_json_file<T: DeserializeOwned>(p: &Path) -> Result<T, AppError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: T = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将JSON数据保存到文件（格式化输出）
pub fn write_json_file<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(p, &bytes)
}

/// 先写同目录临时文件再 rename，读者只会看到完整的旧内容或新内容
pub fn write_atomic(p: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let mut tmp_name = p.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = p.with_file_name(tmp_name);

    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, p) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
