pub mod tour_map;
