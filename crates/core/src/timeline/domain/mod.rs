pub mod excision_map;
