//! 业务能力层（Services）
//!
//! 描述"我能做什么"，只处理单张图像或单个目录，不关心流程：
//! - `discovery` - 发现输入目录中的图像文件
//! - `naming` - 输出文件命名（含历史后缀清理）
//! - `persistence` - 落盘并校验生成的图像
//!
//! 本层不出现队列、worker、迭代编号等编排概念。

pub mod discovery;
pub mod naming;
pub mod persistence;

pub use discovery::list_image_files;
pub use naming::{clean_base_name, output_file_name};
pub use persistence::save_and_verify;
