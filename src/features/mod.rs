/// 健康检查
pub mod health;
/// 运行期配置查询
pub mod remote_config;
/// 云存储链接签发与前缀改写
pub mod storage;
/// 主题内容接口
pub mod theme;
