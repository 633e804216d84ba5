// 集成测试共享工具
#![allow(dead_code)]

pub mod test_data_builder;
